// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file and return the raw `RawConfigFile`.
///
/// Only TOML deserialization happens here; see [`load_and_validate`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    let config: RawConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Load a configuration file and validate it.
///
/// Relative `working_dir` values are resolved against the directory holding
/// the config file.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let mut raw_config = load_from_path(path)?;

    if let Some(dir) = raw_config.run.working_dir.take() {
        let resolved = match path.parent() {
            Some(parent) if dir.is_relative() && !parent.as_os_str().is_empty() => parent.join(dir),
            _ => dir,
        };
        raw_config.run.working_dir = Some(resolved);
    }

    ConfigFile::try_from(raw_config)
}
