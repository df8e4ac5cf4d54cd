// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile, RunSection};
use crate::errors::{Result, RunError};
use crate::exec::parse_duration;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = RunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_run_section(raw.run)
    }
}

fn validate_run_section(run: RunSection) -> Result<ConfigFile> {
    if let Some(ref program) = run.program {
        if program.trim().is_empty() {
            return Err(RunError::ConfigError(
                "[run].program must not be empty".to_string(),
            ));
        }
    }

    let timeout = match run.timeout {
        Some(ref s) => Some(
            parse_duration(s)
                .map_err(|e| RunError::ConfigError(format!("[run].timeout: {e}")))?,
        ),
        None => None,
    };

    if let Some(ref dir) = run.working_dir {
        if !dir.is_dir() {
            return Err(RunError::ConfigError(format!(
                "[run].working_dir '{}' is not a directory",
                dir.display()
            )));
        }
    }

    Ok(ConfigFile {
        program: run.program,
        args: run.args,
        capture_stdout: run.capture_stdout,
        capture_stderr: run.capture_stderr,
        timeout,
        working_dir: run.working_dir,
        env: run.env,
    })
}
