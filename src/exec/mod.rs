// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`launcher`] starts the child (`ProgramExecutor`, `LaunchOptions`).
//! - [`running`] owns the child, waits for it and tracks its exit state.
//! - [`output`] is the line queue between reader tasks and the caller.
//! - [`duration`] parses human-friendly timeouts such as `"3s"`.

pub mod duration;
pub mod launcher;
pub mod output;
pub mod running;

pub use duration::parse_duration;
pub use launcher::{LaunchOptions, ProgramExecutor};
pub use output::{BlockingLines, OutputLines, OutputQueue, output_queue};
pub use running::{ExitInfo, Interrupt, ProgramState, RunningProgram};
