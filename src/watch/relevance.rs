// src/watch/relevance.rs

//! Decide whether a change batch is worth queuing at all.
//!
//! This runs on the watcher's thread, so everything here is read-only: the
//! control thread publishes a fresh [`RelevanceIndex`] whenever the set of
//! active plugins changes, and the watcher only ever reads a snapshot.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::warn;

use crate::engine::ChangeBatch;
use crate::watch::path_utils::{relativize, slash_str};
use crate::watch::patterns::WatchPatterns;

/// Patterns matching the configuration file, relative to each watch dir.
#[derive(Debug, Clone)]
pub struct ConfigFilePatterns {
    set: GlobSet,
}

impl Default for ConfigFilePatterns {
    fn default() -> Self {
        Self {
            set: GlobSet::empty(),
        }
    }
}

impl ConfigFilePatterns {
    /// Build the pattern set for a config file living at `config_path`.
    ///
    /// A config file outside every watch dir yields an empty set, since no
    /// watcher event can ever name it.
    pub fn for_config_file(config_path: &Path, watch_dirs: &[PathBuf]) -> Self {
        let config_path = config_path
            .canonicalize()
            .unwrap_or_else(|_| config_path.to_path_buf());

        let mut builder = GlobSetBuilder::new();
        for dir in watch_dirs {
            let Some(rel) = relativize(dir, &config_path) else {
                continue;
            };
            match Glob::new(&globset::escape(&slash_str(&rel))) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(err) => warn!(?config_path, error = %err, "cannot watch config file"),
            }
        }

        let set = builder.build().unwrap_or_else(|err| {
            warn!(error = %err, "failed to build config file patterns");
            GlobSet::empty()
        });
        Self { set }
    }

    /// Exact relative names, mostly useful in tests.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        let mut builder = GlobSetBuilder::new();
        for name in names {
            if let Ok(glob) = Glob::new(&globset::escape(name.as_ref())) {
                builder.add(glob);
            }
        }
        Self {
            set: builder.build().unwrap_or_else(|_| GlobSet::empty()),
        }
    }

    pub fn matches(&self, rel_path: &Path) -> bool {
        self.set.is_match(slash_str(rel_path).as_str())
    }

    /// True if any `modified` path of the batch is the config file.
    pub fn touched_by(&self, batch: &ChangeBatch) -> bool {
        batch.modified.iter().any(|p| self.matches(p))
    }
}

/// Read-only view of the active plugins' patterns.
#[derive(Debug, Clone, Default)]
pub struct RelevanceIndex {
    plugins: Vec<(String, WatchPatterns)>,
    config_files: ConfigFilePatterns,
}

impl RelevanceIndex {
    pub fn new(plugins: Vec<(String, WatchPatterns)>, config_files: ConfigFilePatterns) -> Self {
        Self {
            plugins,
            config_files,
        }
    }

    pub fn plugin_names(&self) -> impl Iterator<Item = &str> {
        self.plugins.iter().map(|(name, _)| name.as_str())
    }

    pub fn config_files(&self) -> &ConfigFilePatterns {
        &self.config_files
    }

    pub fn is_relevant(&self, batch: &ChangeBatch) -> bool {
        is_relevant(
            batch,
            self.plugins.iter().map(|(_, patterns)| patterns),
            &self.config_files,
        )
    }
}

/// Return true if the batch touches the config file or any path that one of
/// `active_plugins` watches.
///
/// Short-circuits on the first match.
pub fn is_relevant<'a, I>(
    batch: &ChangeBatch,
    active_plugins: I,
    config_files: &ConfigFilePatterns,
) -> bool
where
    I: IntoIterator<Item = &'a WatchPatterns>,
{
    if config_files.touched_by(batch) {
        return true;
    }

    for patterns in active_plugins {
        if batch.paths().any(|p| patterns.matches(p)) {
            return true;
        }
    }

    false
}
