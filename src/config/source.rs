// src/config/source.rs

//! Turning configuration into registered groups and plugins.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::errors::Result;
use crate::exec::CommandRunner;
use crate::fs::FileSystem;
use crate::plugin::{CommandPlugin, CommandSet, Group, Registry};
use crate::watch::patterns::{PatternSpec, WatchPatterns};

/// Where groups and plugins come from.
///
/// `evaluate` runs once at startup; `reevaluate` on a hot reload. Both hand
/// back a complete, fresh registry; the caller decides when to swap it in.
/// `[config]` options are not part of it and are only read at startup.
pub trait ConfigSource: Send {
    fn evaluate(&mut self) -> Result<Registry>;

    fn reevaluate(&mut self) -> Result<Registry> {
        self.evaluate()
    }

    /// The file this source reads, if any, so edits to it trigger a reload.
    fn config_path(&self) -> Option<&Path> {
        None
    }
}

/// Reads a TOML config file and builds [`CommandPlugin`]s from it.
pub struct TomlConfigSource {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
    runner: Arc<dyn CommandRunner>,
    workdir: Option<PathBuf>,
}

impl std::fmt::Debug for TomlConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TomlConfigSource")
            .field("path", &self.path)
            .field("workdir", &self.workdir)
            .finish_non_exhaustive()
    }
}

impl TomlConfigSource {
    pub fn new(
        path: impl Into<PathBuf>,
        fs: Arc<dyn FileSystem>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            path: path.into(),
            fs,
            runner,
            workdir: None,
        }
    }

    /// Directory plugin commands run in.
    pub fn workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }
}

impl ConfigSource for TomlConfigSource {
    fn evaluate(&mut self) -> Result<Registry> {
        debug!(path = ?self.path, "evaluating config");
        let cfg = load_and_validate(self.fs.as_ref(), &self.path)?;
        build_registry(&cfg, &self.runner, self.workdir.as_deref())
    }

    fn config_path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// Register the declared groups, then every plugin (creating any group a
/// plugin names but nobody declared).
pub fn build_registry(
    cfg: &ConfigFile,
    runner: &Arc<dyn CommandRunner>,
    workdir: Option<&Path>,
) -> Result<Registry> {
    let mut registry = Registry::new();

    for (name, group) in cfg.groups() {
        registry.add_group(Group {
            name: name.clone(),
            halt_on_fail: group.halt_on_fail,
        });
    }

    for (name, plugin) in cfg.plugins() {
        let patterns = WatchPatterns::compile(&PatternSpec {
            watch: plugin.watch.clone(),
            watch_regex: plugin.watch_regex.clone(),
            exclude: plugin.exclude.clone(),
        })?;

        let commands = CommandSet {
            changes: plugin.cmd.clone(),
            run_all: plugin.run_all.clone(),
            start: plugin.start.clone(),
            stop: plugin.stop.clone(),
            reload: plugin.reload.clone(),
        };
        let mut command_plugin = CommandPlugin::new(name.clone(), commands, Arc::clone(runner))
            .all_on_start(plugin.all_on_start);
        if let Some(dir) = workdir {
            command_plugin = command_plugin.cwd(dir);
        }

        registry.add_plugin(
            name.clone(),
            plugin.effective_group(),
            patterns,
            Box::new(command_plugin),
        )?;
    }

    Ok(registry)
}
