// src/config/validate.rs

use regex::Regex;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, WatchrunnerError};
use crate::watch::patterns::build_globset;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = WatchrunnerError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.group, raw.plugin))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_plugins(cfg)?;
    validate_global_config(cfg)?;
    validate_plugin_patterns(cfg)?;
    Ok(())
}

fn ensure_has_plugins(cfg: &RawConfigFile) -> Result<()> {
    if cfg.plugin.is_empty() {
        return Err(WatchrunnerError::ConfigError(
            "config must contain at least one [plugin.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    for (key, value) in [
        ("latency", cfg.config.latency),
        ("wait_for_delay", cfg.config.wait_for_delay),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(WatchrunnerError::ConfigError(format!(
                "[config].{key} must be a non-negative number of seconds (got {value})"
            )));
        }
    }

    build_globset(&cfg.config.ignore)?;
    Ok(())
}

fn validate_plugin_patterns(cfg: &RawConfigFile) -> Result<()> {
    for (name, plugin) in cfg.plugin.iter() {
        if plugin.effective_group().trim().is_empty() {
            return Err(WatchrunnerError::ConfigError(format!(
                "plugin '{name}' has an empty group name"
            )));
        }

        build_globset(&plugin.watch)?;
        build_globset(&plugin.exclude)?;

        for pattern in plugin.watch_regex.iter() {
            if let Err(err) = Regex::new(pattern) {
                return Err(WatchrunnerError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: format!("in plugin '{name}': {err}"),
                });
            }
        }
    }
    Ok(())
}
