// src/config/loader.rs

use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, WatchrunnerError};
use crate::fs::FileSystem;

/// Default config file name, looked up in the current working directory.
pub const DEFAULT_CONFIG_FILE: &str = "Watchrunner.toml";

/// Parse TOML text into a `RawConfigFile`.
///
/// This only performs deserialization; it does **not** validate. Use
/// [`load_and_validate`] for that.
pub fn parse_str(contents: &str) -> Result<RawConfigFile> {
    let config: RawConfigFile = toml::from_str(contents)?;
    Ok(config)
}

/// Load a configuration file through `fs` and return the raw `RawConfigFile`.
pub fn load_from_path(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs
        .read_to_string(path)
        .map_err(|err| WatchrunnerError::ConfigError(format!("{err:#}")))?;
    parse_str(&contents)
}

/// Load a configuration file and run validation.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks that there is at least one plugin, that every glob and regex
///   compiles, and that tuning values are sane.
pub fn load_and_validate(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(fs, &path)?;
    ConfigFile::try_from(raw_config)
}

/// Resolve the config path used when `--config` is not given.
pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}
