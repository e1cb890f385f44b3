// src/plugin/registry.rs

use std::fmt;

use tracing::debug;

use crate::errors::{Result, WatchrunnerError};
use crate::plugin::Plugin;
use crate::scope::Scope;
use crate::watch::patterns::WatchPatterns;

/// Name of the group plugins land in when they do not name one.
pub const DEFAULT_GROUP: &str = "default";

/// Named collection of plugins, used for scoping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    /// Stop running the rest of this group's plugins once one task fails.
    pub halt_on_fail: bool,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            halt_on_fail: false,
        }
    }
}

/// A registered plugin: its identity, group key, patterns and hooks.
pub struct PluginEntry {
    pub name: String,
    /// Lookup key into the registry's groups, not an ownership edge.
    pub group: String,
    pub patterns: WatchPatterns,
    pub plugin: Box<dyn Plugin>,
}

impl fmt::Debug for PluginEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginEntry")
            .field("name", &self.name)
            .field("group", &self.group)
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

/// Every group and plugin, each in registration order.
///
/// The `default` group always exists and comes first.
#[derive(Debug)]
pub struct Registry {
    groups: Vec<Group>,
    plugins: Vec<PluginEntry>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            groups: vec![Group::new(DEFAULT_GROUP)],
            plugins: Vec::new(),
        }
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }

    pub fn plugins(&self) -> impl Iterator<Item = &PluginEntry> {
        self.plugins.iter()
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn plugin(&self, name: &str) -> Option<&PluginEntry> {
        self.plugins.iter().find(|p| p.name == name)
    }

    pub fn plugin_mut(&mut self, name: &str) -> Option<&mut PluginEntry> {
        self.plugins.iter_mut().find(|p| p.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Register a group, or update the options of an existing one.
    pub fn add_group(&mut self, group: Group) {
        match self.groups.iter_mut().find(|g| g.name == group.name) {
            Some(existing) => *existing = group,
            None => self.groups.push(group),
        }
    }

    /// Look up a group by name, creating it if absent.
    pub fn ensure_group(&mut self, name: &str) -> &Group {
        let idx = match self.groups.iter().position(|g| g.name == name) {
            Some(idx) => idx,
            None => {
                debug!(group = %name, "creating group on demand");
                self.groups.push(Group::new(name));
                self.groups.len() - 1
            }
        };
        &self.groups[idx]
    }

    /// Register a plugin. Its group is created if needed.
    pub fn add_plugin(
        &mut self,
        name: impl Into<String>,
        group: impl Into<String>,
        patterns: WatchPatterns,
        plugin: Box<dyn Plugin>,
    ) -> Result<()> {
        let name = name.into();
        let group = group.into();

        if self.plugin(&name).is_some() {
            return Err(WatchrunnerError::DuplicatePlugin(name));
        }
        self.ensure_group(&group);

        self.plugins.push(PluginEntry {
            name,
            group,
            patterns,
            plugin,
        });
        Ok(())
    }

    /// Unregister a plugin, returning it if it was present.
    pub fn remove_plugin(&mut self, name: &str) -> Option<PluginEntry> {
        let idx = self.plugins.iter().position(|p| p.name == name)?;
        Some(self.plugins.remove(idx))
    }

    /// Plugin names selected by `scope`, bucketed by group in group order.
    ///
    /// - Plugins named in the scope win over groups.
    /// - Otherwise, the plugins of the named groups.
    /// - An empty scope selects everything.
    pub fn scoped(&self, scope: &Scope) -> Vec<(String, Vec<String>)> {
        let selected = |entry: &PluginEntry| {
            if !scope.plugins().is_empty() {
                scope.plugins().contains(&entry.name)
            } else if !scope.groups().is_empty() {
                scope.groups().contains(&entry.group)
            } else {
                true
            }
        };

        self.groups
            .iter()
            .filter_map(|group| {
                let names: Vec<String> = self
                    .plugins
                    .iter()
                    .filter(|p| p.group == group.name && selected(p))
                    .map(|p| p.name.clone())
                    .collect();
                (!names.is_empty()).then(|| (group.name.clone(), names))
            })
            .collect()
    }

    /// `(name, patterns)` for every plugin `scope` selects, in the order
    /// the runner visits them.
    pub fn pattern_table(&self, scope: &Scope) -> Vec<(String, WatchPatterns)> {
        self.scoped(scope)
            .into_iter()
            .flat_map(|(_, names)| names)
            .filter_map(|name| {
                self.plugin(&name)
                    .map(|entry| (name.clone(), entry.patterns.clone()))
            })
            .collect()
    }
}
