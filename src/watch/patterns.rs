// src/watch/patterns.rs

use std::fmt;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::RegexSet;

use crate::errors::{Result, WatchrunnerError};
use crate::watch::path_utils::slash_str;

/// Raw pattern lists for a single plugin, as they appear in `[plugin.<name>]`.
///
/// ```toml
/// [plugin.rspec]
/// watch = ["**/*.rb"]
/// watch_regex = ['^spec/(.+)_spec\.rb$']
/// exclude = ["tmp/**"]
/// ```
#[derive(Debug, Clone, Default)]
pub struct PatternSpec {
    pub watch: Vec<String>,
    pub watch_regex: Vec<String>,
    pub exclude: Vec<String>,
}

/// Compiled watch patterns for one plugin.
///
/// Patterns are evaluated against paths relative to a watch dir, with forward
/// slashes (e.g. `"app/models/user.rb"`). A path matches when any glob or
/// regex accepts it and no exclude glob does.
#[derive(Clone)]
pub struct WatchPatterns {
    globs: GlobSet,
    regexes: RegexSet,
    exclude: Option<GlobSet>,
}

impl fmt::Debug for WatchPatterns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchPatterns")
            .field("globs", &self.globs.len())
            .field("regexes", &self.regexes.patterns())
            .finish_non_exhaustive()
    }
}

impl WatchPatterns {
    pub fn compile(spec: &PatternSpec) -> Result<Self> {
        let globs = build_globset(&spec.watch)?;
        let regexes = RegexSet::new(&spec.watch_regex).map_err(|err| {
            WatchrunnerError::InvalidPattern {
                pattern: spec.watch_regex.join(", "),
                reason: err.to_string(),
            }
        })?;
        let exclude = if spec.exclude.is_empty() {
            None
        } else {
            Some(build_globset(&spec.exclude)?)
        };

        Ok(Self {
            globs,
            regexes,
            exclude,
        })
    }

    /// Patterns that never match anything.
    pub fn empty() -> Self {
        Self {
            globs: GlobSet::empty(),
            regexes: RegexSet::empty(),
            exclude: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.globs.is_empty() && self.regexes.is_empty()
    }

    pub fn matches(&self, rel_path: &Path) -> bool {
        let rel = slash_str(rel_path);

        if !self.globs.is_match(rel.as_str()) && !self.regexes.is_match(&rel) {
            return false;
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(rel.as_str()) {
                return false;
            }
        }
        true
    }

    /// Keep only the paths these patterns care about, preserving order.
    pub fn select<'a, I>(&self, paths: I) -> Vec<std::path::PathBuf>
    where
        I: IntoIterator<Item = &'a std::path::PathBuf>,
    {
        paths
            .into_iter()
            .filter(|p| self.matches(p))
            .cloned()
            .collect()
    }
}

/// Build a GlobSet from simple string patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).map_err(|err| WatchrunnerError::InvalidPattern {
            pattern: pat.clone(),
            reason: err.to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|err| WatchrunnerError::InvalidPattern {
        pattern: patterns.join(", "),
        reason: err.to_string(),
    })
}
