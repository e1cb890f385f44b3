// src/scope.rs

//! Scope resolution: from user-supplied group/plugin names to registered
//! entities.
//!
//! An empty dimension means "no restriction", never "restrict to nothing".
//! Every consumer of [`Scope`] relies on that split.

use crate::errors::{Result, WatchrunnerError};
use crate::plugin::Registry;

/// Unresolved names, as typed by a user or carried by a control action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeRequest {
    pub groups: Vec<String>,
    pub plugins: Vec<String>,
}

impl ScopeRequest {
    pub fn groups<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            groups: names.into_iter().map(Into::into).collect(),
            plugins: Vec::new(),
        }
    }

    pub fn plugins<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            groups: Vec::new(),
            plugins: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.plugins.is_empty()
    }
}

/// Resolved subset of groups and plugins. Names are lookup keys into the
/// registry, without duplicates, in the order they were requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    groups: Vec<String>,
    plugins: Vec<String>,
}

impl Scope {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn plugins(&self) -> &[String] {
        &self.plugins
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.plugins.is_empty()
    }

    /// `self` unless it is unrestricted, in which case `fallback`.
    pub fn or<'a>(&'a self, fallback: &'a Scope) -> &'a Scope {
        if self.is_empty() { fallback } else { self }
    }
}

/// Look up every requested name in the registry.
///
/// Unknown group names create the group; unknown plugin names are an error.
pub fn resolve(registry: &mut Registry, request: &ScopeRequest) -> Result<Scope> {
    let mut scope = Scope::default();

    // Plugins first, so a failed lookup leaves no groups behind.
    for name in &request.plugins {
        let Some(entry) = registry.plugin(name) else {
            return Err(WatchrunnerError::UnknownPlugin(name.clone()));
        };
        if !scope.plugins.contains(&entry.name) {
            scope.plugins.push(entry.name.clone());
        }
    }

    for name in &request.groups {
        let group = registry.ensure_group(name);
        if !scope.groups.contains(&group.name) {
            scope.groups.push(group.name.clone());
        }
    }

    Ok(scope)
}
