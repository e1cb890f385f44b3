#![allow(dead_code)]

use std::collections::BTreeMap;

use watchrunner::config::{ConfigFile, ConfigSection, GroupConfig, PluginConfig, RawConfigFile};
use watchrunner::plugin::{Group, Registry};
use watchrunner::watch::{PatternSpec, WatchPatterns};

use crate::fakes::{CallLog, Failure, RecordingPlugin};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                group: BTreeMap::new(),
                plugin: BTreeMap::new(),
            },
        }
    }

    pub fn with_plugin(mut self, name: &str, plugin: PluginConfig) -> Self {
        self.config.plugin.insert(name.to_string(), plugin);
        self
    }

    pub fn with_group(mut self, name: &str, halt_on_fail: bool) -> Self {
        self.config
            .group
            .insert(name.to_string(), GroupConfig { halt_on_fail });
        self
    }

    pub fn with_watch_dir(mut self, dir: &str) -> Self {
        self.config.config.watch_dirs.push(dir.into());
        self
    }

    pub fn with_ignore(mut self, pattern: &str) -> Self {
        self.config.config.ignore.push(pattern.to_string());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `PluginConfig`.
pub struct PluginConfigBuilder {
    plugin: PluginConfig,
}

impl PluginConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            plugin: PluginConfig {
                cmd: Some(cmd.to_string()),
                ..PluginConfig::default()
            },
        }
    }

    pub fn group(mut self, name: &str) -> Self {
        self.plugin.group = Some(name.to_string());
        self
    }

    pub fn watch(mut self, pattern: &str) -> Self {
        self.plugin.watch.push(pattern.to_string());
        self
    }

    pub fn watch_regex(mut self, pattern: &str) -> Self {
        self.plugin.watch_regex.push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.plugin.exclude.push(pattern.to_string());
        self
    }

    pub fn run_all(mut self, cmd: &str) -> Self {
        self.plugin.run_all = Some(cmd.to_string());
        self
    }

    pub fn start(mut self, cmd: &str) -> Self {
        self.plugin.start = Some(cmd.to_string());
        self
    }

    pub fn stop(mut self, cmd: &str) -> Self {
        self.plugin.stop = Some(cmd.to_string());
        self
    }

    pub fn all_on_start(mut self, val: bool) -> Self {
        self.plugin.all_on_start = val;
        self
    }

    pub fn build(self) -> PluginConfig {
        self.plugin
    }
}

/// Builds a `Registry` of `RecordingPlugin`s that all write to one log.
pub struct RegistryBuilder {
    log: CallLog,
    groups: Vec<Group>,
    plugins: Vec<(String, String, Vec<String>, Vec<(&'static str, Failure)>)>,
}

impl RegistryBuilder {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            groups: Vec::new(),
            plugins: Vec::new(),
        }
    }

    pub fn group(mut self, name: &str, halt_on_fail: bool) -> Self {
        self.groups.push(Group {
            name: name.to_string(),
            halt_on_fail,
        });
        self
    }

    /// Plugin in `group` watching the given globs.
    pub fn plugin(mut self, name: &str, group: &str, watch: &[&str]) -> Self {
        self.plugins.push((
            name.to_string(),
            group.to_string(),
            watch.iter().map(|s| s.to_string()).collect(),
            Vec::new(),
        ));
        self
    }

    /// Make the most recently added plugin fail in `hook`.
    pub fn failing(mut self, hook: &'static str, failure: Failure) -> Self {
        if let Some(last) = self.plugins.last_mut() {
            last.3.push((hook, failure));
        }
        self
    }

    pub fn build(&self) -> Registry {
        let mut registry = Registry::new();
        for group in &self.groups {
            registry.add_group(group.clone());
        }
        for (name, group, watch, failures) in &self.plugins {
            let patterns = WatchPatterns::compile(&PatternSpec {
                watch: watch.clone(),
                ..PatternSpec::default()
            })
            .expect("valid test patterns");

            let mut plugin = RecordingPlugin::new(name, self.log.clone());
            for (hook, failure) in failures {
                plugin = plugin.fail_on(hook, *failure);
            }
            registry
                .add_plugin(name.clone(), group.clone(), patterns, Box::new(plugin))
                .expect("unique test plugin names");
        }
        registry
    }
}
