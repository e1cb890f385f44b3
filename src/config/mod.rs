// src/config/mod.rs

//! Configuration loading and validation for watchrunner.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file through the filesystem abstraction (`loader.rs`).
//! - Validate patterns and tuning values (`validate.rs`).
//! - Build the group/plugin registry from a config (`source.rs`).

pub mod loader;
pub mod model;
pub mod source;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, parse_str, DEFAULT_CONFIG_FILE};
pub use model::{ConfigFile, ConfigSection, GroupConfig, PluginConfig, RawConfigFile};
pub use source::{build_registry, ConfigSource, TomlConfigSource};
