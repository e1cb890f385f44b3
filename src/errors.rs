// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchrunnerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Unknown plugin: {0}")]
    UnknownPlugin(String),

    #[error("Plugin already registered: {0}")]
    DuplicatePlugin(String),

    #[error("Invalid pause mode: {0} (expected \"paused\", \"unpaused\" or \"toggle\")")]
    InvalidPauseMode(String),

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Watch directory does not exist: {0}")]
    WatchDir(PathBuf),

    #[error("File watcher error: {0}")]
    Watcher(#[from] notify::Error),

    #[error("Plugin '{plugin}' failed in {hook} (exit code {code})")]
    TaskFailed {
        plugin: String,
        hook: &'static str,
        code: i32,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, WatchrunnerError>;
