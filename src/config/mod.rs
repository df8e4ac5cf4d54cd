// src/config/mod.rs

//! Optional TOML configuration describing what to run.
//!
//! - `model.rs`: raw (serde) and validated shapes.
//! - `loader.rs`: read a file from disk.
//! - `validate.rs`: `RawConfigFile` → `ConfigFile`.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{ConfigFile, RawConfigFile, RunSection};
