// src/exec/launcher.rs

//! Starting the child process.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::{Result, RunError};
use crate::exec::running::RunningProgram;

/// How to start the child.
///
/// Streams that are not redirected are inherited from this process, as is
/// stdin.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Capture stdout into the output sequence (default: true).
    pub redirect_stdout: bool,

    /// Capture stderr into its own sequence (default: false).
    pub redirect_stderr: bool,

    /// Kill the child if it is still running this long after launch.
    pub timeout: Option<Duration>,

    pub working_dir: Option<PathBuf>,

    /// Extra environment variables, merged over the inherited environment.
    pub env: BTreeMap<String, String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            redirect_stdout: true,
            redirect_stderr: false,
            timeout: None,
            working_dir: None,
            env: BTreeMap::new(),
        }
    }
}

impl LaunchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redirect_stdout(mut self, capture: bool) -> Self {
        self.redirect_stdout = capture;
        self
    }

    pub fn redirect_stderr(mut self, capture: bool) -> Self {
        self.redirect_stderr = capture;
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// Launches one named program. No shell is involved: arguments are passed to
/// the program exactly as given.
#[derive(Debug, Clone)]
pub struct ProgramExecutor {
    program: String,
}

impl ProgramExecutor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Start the program and wait until it has exited.
    ///
    /// On return the exit code is available and every captured line is
    /// already queued in the handle.
    pub async fn execute<I, S>(
        &self,
        args: I,
        redirect_stdout: bool,
        redirect_stderr: bool,
    ) -> Result<RunningProgram>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let options = LaunchOptions::new()
            .redirect_stdout(redirect_stdout)
            .redirect_stderr(redirect_stderr);
        self.execute_with(args, &options).await
    }

    /// [`ProgramExecutor::execute`] with full [`LaunchOptions`].
    pub async fn execute_with<I, S>(&self, args: I, options: &LaunchOptions) -> Result<RunningProgram>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut running = self.spawn(args, options)?;
        running.wait().await?;
        Ok(running)
    }

    /// Start the program without waiting for it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<I, S>(&self, args: I, options: &LaunchOptions) -> Result<RunningProgram>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<OsString> = args
            .into_iter()
            .map(|a| a.as_ref().to_os_string())
            .collect();

        info!(
            program = %self.program,
            args = ?args,
            capture_stdout = options.redirect_stdout,
            capture_stderr = options.redirect_stderr,
            "starting process"
        );

        let mut cmd = Command::new(&self.program);
        cmd.args(&args)
            .stdin(Stdio::inherit())
            .stdout(stdio_for(options.redirect_stdout))
            .stderr(stdio_for(options.redirect_stderr))
            .kill_on_drop(true);

        if let Some(ref dir) = options.working_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &options.env {
            cmd.env(key, value);
        }

        let child = cmd.spawn().map_err(|source| RunError::Launch {
            program: self.program.clone(),
            source,
        })?;

        debug!(program = %self.program, pid = ?child.id(), "process started");

        Ok(RunningProgram::attach(
            self.program.clone(),
            child,
            options.timeout,
        ))
    }
}

fn stdio_for(capture: bool) -> Stdio {
    if capture {
        Stdio::piped()
    } else {
        Stdio::inherit()
    }
}
