// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `runprog`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "runprog",
    version,
    about = "Run a program, capture its output line by line, and replay it once it exits.",
    long_about = None
)]
pub struct CliArgs {
    /// Optional TOML file describing the program to run.
    ///
    /// Values given on the command line override the file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Let the child write straight to our stdout instead of capturing it.
    #[arg(long)]
    pub no_capture_stdout: bool,

    /// Capture the child's stderr as well (replayed on our stderr).
    #[arg(long)]
    pub capture_stderr: bool,

    /// Kill the child if it runs longer than this (e.g. `250ms`, `3s`, `1m`).
    ///
    /// Without a timeout the wait is unbounded.
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RUNPROG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Program to run. Required unless provided by `--config`.
    #[arg(value_name = "PROGRAM")]
    pub program: Option<String>,

    /// Arguments passed verbatim to the program (no shell is involved).
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
