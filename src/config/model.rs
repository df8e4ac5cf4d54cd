// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [run]
/// program = "sh"
/// args = ["-c", "echo 1; echo 2"]
/// capture_stdout = true
/// capture_stderr = false
/// timeout = "30s"
///
/// [run.env]
/// GREETING = "hi"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub run: RunSection,
}

/// `[run]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSection {
    /// Program name or path. May be left out when the CLI supplies one.
    #[serde(default)]
    pub program: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default = "default_capture_stdout")]
    pub capture_stdout: bool,

    #[serde(default)]
    pub capture_stderr: bool,

    /// Duration string such as `"500ms"` or `"2m"`.
    #[serde(default)]
    pub timeout: Option<String>,

    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

fn default_capture_stdout() -> bool {
    true
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            program: None,
            args: Vec::new(),
            capture_stdout: default_capture_stdout(),
            capture_stderr: false,
            timeout: None,
            working_dir: None,
            env: BTreeMap::new(),
        }
    }
}

/// Validated configuration. Build it through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub program: Option<String>,
    pub args: Vec<String>,
    pub capture_stdout: bool,
    pub capture_stderr: bool,
    pub timeout: Option<Duration>,
    pub working_dir: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            program: None,
            args: Vec::new(),
            capture_stdout: true,
            capture_stderr: false,
            timeout: None,
            working_dir: None,
            env: BTreeMap::new(),
        }
    }
}
