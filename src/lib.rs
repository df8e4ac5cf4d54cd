// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;

use std::io::Write;

use anyhow::{anyhow, bail, Result};
use tracing::{debug, warn};

use crate::cli::CliArgs;
use crate::config::{load_and_validate, ConfigFile};
use crate::exec::{parse_duration, LaunchOptions, ProgramExecutor};

/// High-level entry point used by `main.rs`.
///
/// Resolves what to run (CLI over config file), runs it to completion, then
/// replays the captured lines: stdout lines on stdout, stderr lines on stderr.
/// Returns the child's exit code.
pub async fn run(args: CliArgs) -> Result<i32> {
    let file_cfg = match args.config {
        Some(ref path) => load_and_validate(path)?,
        None => ConfigFile::default(),
    };
    let plan = RunPlan::resolve(&args, file_cfg)?;

    let executor = ProgramExecutor::new(&plan.program);
    let mut running = executor.execute_with(&plan.args, &plan.options).await?;

    if let Some(mut output) = running.take_output() {
        let mut stdout = std::io::stdout();
        while let Some(line) = output.next_line().await {
            writeln!(stdout, "{line}")?;
        }
        stdout.flush()?;
    }

    if let Some(errors) = running.take_stderr() {
        let mut stderr = std::io::stderr();
        for line in errors.collect_lines().await {
            writeln!(stderr, "{line}")?;
        }
    }

    if running.timed_out() {
        warn!(program = %plan.program, "process was killed after exceeding its timeout");
    }

    let code = running.exit_code()?;
    debug!(exit_code = code, "run complete");
    Ok(code)
}

/// Everything needed to launch the child, after merging CLI and config.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub program: String,
    pub args: Vec<String>,
    pub options: LaunchOptions,
}

impl RunPlan {
    /// Merge CLI arguments over a validated config file.
    ///
    /// A program given on the command line replaces both the program and the
    /// argument list from the file.
    pub fn resolve(args: &CliArgs, cfg: ConfigFile) -> Result<Self> {
        let (program, run_args) = match args.program {
            Some(ref program) => (program.clone(), args.args.clone()),
            None => match cfg.program {
                Some(program) => (program, cfg.args),
                None => bail!("no program given; pass PROGRAM or set [run].program in --config"),
            },
        };

        let timeout = match args.timeout {
            Some(ref s) => Some(parse_duration(s).map_err(|e| anyhow!("--timeout: {e}"))?),
            None => cfg.timeout,
        };

        let mut options = LaunchOptions::new()
            .redirect_stdout(cfg.capture_stdout && !args.no_capture_stdout)
            .redirect_stderr(cfg.capture_stderr || args.capture_stderr);
        options.timeout = timeout;
        options.working_dir = cfg.working_dir;
        options.env = cfg.env;

        Ok(Self {
            program,
            args: run_args,
            options,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use clap::Parser;

    use super::*;

    fn cli(argv: &[&str]) -> CliArgs {
        let mut full = vec!["runprog"];
        full.extend_from_slice(argv);
        CliArgs::try_parse_from(full).unwrap()
    }

    #[test]
    fn cli_program_replaces_config_program_and_args() {
        let cfg = ConfigFile {
            program: Some("sh".to_string()),
            args: vec!["-c".to_string(), "echo from file".to_string()],
            ..ConfigFile::default()
        };

        let plan = RunPlan::resolve(&cli(&["echo", "hi"]), cfg).unwrap();
        assert_eq!(plan.program, "echo");
        assert_eq!(plan.args, vec!["hi"]);
    }

    #[test]
    fn config_supplies_program_when_cli_does_not() {
        let cfg = ConfigFile {
            program: Some("sh".to_string()),
            args: vec!["-c".to_string(), "true".to_string()],
            capture_stderr: true,
            timeout: Some(Duration::from_secs(5)),
            ..ConfigFile::default()
        };

        let plan = RunPlan::resolve(&cli(&["--timeout", "2s"]), cfg).unwrap();
        assert_eq!(plan.program, "sh");
        assert_eq!(plan.args, vec!["-c", "true"]);
        assert!(plan.options.redirect_stdout);
        assert!(plan.options.redirect_stderr);
        assert_eq!(plan.options.timeout, Some(Duration::from_secs(2)));
    }

    #[test]
    fn missing_program_is_an_error() {
        let err = RunPlan::resolve(&cli(&[]), ConfigFile::default()).unwrap_err();
        assert!(err.to_string().contains("no program given"));
    }

    #[test]
    fn cli_can_turn_stdout_capture_off() {
        let plan =
            RunPlan::resolve(&cli(&["--no-capture-stdout", "true"]), ConfigFile::default())
                .unwrap();
        assert!(!plan.options.redirect_stdout);
        assert!(!plan.options.redirect_stderr);
    }

    #[test]
    fn invalid_cli_timeout_is_reported() {
        let err = RunPlan::resolve(&cli(&["--timeout", "fast", "true"]), ConfigFile::default())
            .unwrap_err();
        assert!(err.to_string().contains("--timeout"));
    }
}
