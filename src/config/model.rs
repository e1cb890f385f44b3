// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// watch_dirs = ["app", "spec"]
/// notify = false
///
/// [group.backend]
/// halt_on_fail = true
///
/// [plugin.rspec]
/// group = "backend"
/// watch = ["**/*.rb"]
/// cmd = "bundle exec rspec {paths}"
/// run_all = "bundle exec rspec"
/// ```
///
/// All sections are optional and have reasonable defaults; validation
/// (see `validate.rs`) turns this into a [`ConfigFile`].
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    /// Global behaviour config from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// Group options from `[group.<name>]`.
    #[serde(default)]
    pub group: BTreeMap<String, GroupConfig>,

    /// All plugins from `[plugin.<name>]`, keyed by plugin name.
    #[serde(default)]
    pub plugin: BTreeMap<String, PluginConfig>,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    group: BTreeMap<String, GroupConfig>,
    plugin: BTreeMap<String, PluginConfig>,
}

impl ConfigFile {
    /// Only `TryFrom<RawConfigFile>` should call this.
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        group: BTreeMap<String, GroupConfig>,
        plugin: BTreeMap<String, PluginConfig>,
    ) -> Self {
        Self {
            config,
            group,
            plugin,
        }
    }

    pub fn config_section(&self) -> &ConfigSection {
        &self.config
    }

    pub fn groups(&self) -> &BTreeMap<String, GroupConfig> {
        &self.group
    }

    pub fn plugins(&self) -> &BTreeMap<String, PluginConfig> {
        &self.plugin
    }
}

/// `[config]` section. Tuning values are handed to the watcher backend as-is.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Directories to watch. Empty means the current working directory.
    #[serde(default)]
    pub watch_dirs: Vec<PathBuf>,

    /// Backend latency in seconds (poll interval when polling).
    #[serde(default = "default_latency")]
    pub latency: f64,

    /// Use the polling backend instead of native notifications.
    #[serde(default)]
    pub force_polling: bool,

    /// Seconds to wait for more events before flushing a burst.
    #[serde(default = "default_wait_for_delay")]
    pub wait_for_delay: f64,

    /// Globs, relative to a watch dir, the backend drops outright.
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Turn notifications on. `WATCHRUNNER_NOTIFY=false` always wins.
    #[serde(default = "default_true")]
    pub notify: bool,

    /// Log every command plugins execute.
    #[serde(default)]
    pub debug: bool,
}

fn default_latency() -> f64 {
    0.25
}

fn default_wait_for_delay() -> f64 {
    0.1
}

fn default_true() -> bool {
    true
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            watch_dirs: Vec::new(),
            latency: default_latency(),
            force_polling: false,
            wait_for_delay: default_wait_for_delay(),
            ignore: Vec::new(),
            notify: true,
            debug: false,
        }
    }
}

/// `[group.<name>]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct GroupConfig {
    /// Skip the group's remaining plugins once one task fails.
    #[serde(default)]
    pub halt_on_fail: bool,
}

/// `[plugin.<name>]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PluginConfig {
    /// Owning group; `"default"` if omitted.
    #[serde(default)]
    pub group: Option<String>,

    /// Globs over watch-dir-relative paths.
    #[serde(default)]
    pub watch: Vec<String>,

    /// Regexes over watch-dir-relative paths (forward slashes).
    #[serde(default)]
    pub watch_regex: Vec<String>,

    /// Globs removed from whatever `watch`/`watch_regex` matched.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Command run on changes; `{paths}` expands to the matched paths.
    #[serde(default)]
    pub cmd: Option<String>,

    #[serde(default)]
    pub run_all: Option<String>,

    #[serde(default)]
    pub start: Option<String>,

    #[serde(default)]
    pub stop: Option<String>,

    #[serde(default)]
    pub reload: Option<String>,

    /// Run the `run_all` command as part of `start`.
    #[serde(default)]
    pub all_on_start: bool,
}

impl PluginConfig {
    pub fn effective_group(&self) -> &str {
        self.group.as_deref().unwrap_or(crate::plugin::DEFAULT_GROUP)
    }
}
