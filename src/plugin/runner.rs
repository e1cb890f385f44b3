// src/plugin/runner.rs

//! Dispatches lifecycle and change calls to the plugins of a scope.
//!
//! A `Runner` is built per call around the coordinator's registry and
//! notifier. It never hands plugin errors back to the caller: task failures
//! may halt a group, anything else (a panicking hook included) disables the
//! offending plugin, and both are reported in the returned [`RunReport`].

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;

use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::engine::ChangeBatch;
use crate::errors::WatchrunnerError;
use crate::notifier::{Notification, NotificationKind, Notifier};
use crate::plugin::registry::Registry;
use crate::plugin::{HookFuture, Plugin};
use crate::scope::Scope;
use crate::types::LifecycleTask;

/// What happened during one runner call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// `(plugin, hook)` for every hook that was called.
    pub invoked: Vec<(String, &'static str)>,
    /// Plugins whose task failed.
    pub failed: Vec<String>,
    /// Plugins removed from the registry after an unexpected error.
    pub disabled: Vec<String>,
    /// Groups whose remaining plugins were skipped after a failure.
    pub halted: Vec<String>,
}

/// A single hook invocation with its arguments.
#[derive(Debug, Clone, Copy)]
enum Hook<'a> {
    Lifecycle(LifecycleTask),
    Modifications(&'a [PathBuf]),
    Additions(&'a [PathBuf]),
    Removals(&'a [PathBuf]),
}

impl<'a> Hook<'a> {
    fn name(&self) -> &'static str {
        match self {
            Hook::Lifecycle(task) => task.as_str(),
            Hook::Modifications(_) => "run_on_modifications",
            Hook::Additions(_) => "run_on_additions",
            Hook::Removals(_) => "run_on_removals",
        }
    }

    fn paths(&self) -> &'a [PathBuf] {
        match *self {
            Hook::Lifecycle(_) => &[],
            Hook::Modifications(p) | Hook::Additions(p) | Hook::Removals(p) => p,
        }
    }

    fn call<'p>(self, plugin: &'p mut dyn Plugin) -> HookFuture<'p>
    where
        Self: 'p,
    {
        match self {
            Hook::Lifecycle(LifecycleTask::Start) => plugin.start(),
            Hook::Lifecycle(LifecycleTask::Stop) => plugin.stop(),
            Hook::Lifecycle(LifecycleTask::Reload) => plugin.reload(),
            Hook::Lifecycle(LifecycleTask::RunAll) => plugin.run_all(),
            Hook::Modifications(paths) => plugin.run_on_modifications(paths),
            Hook::Additions(paths) => plugin.run_on_additions(paths),
            Hook::Removals(paths) => plugin.run_on_removals(paths),
        }
    }
}

enum Outcome {
    Ok,
    Failed,
    Disabled,
}

pub struct Runner<'a> {
    registry: &'a mut Registry,
    notifier: &'a dyn Notifier,
    report: RunReport,
}

impl<'a> Runner<'a> {
    pub fn new(registry: &'a mut Registry, notifier: &'a dyn Notifier) -> Self {
        Self {
            registry,
            notifier,
            report: RunReport::default(),
        }
    }

    /// Run a lifecycle hook on every plugin in `scope`, group by group.
    pub async fn run(mut self, task: LifecycleTask, scope: &Scope) -> RunReport {
        debug!(%task, ?scope, "running lifecycle task");

        for (group, plugins) in self.registry.scoped(scope) {
            for name in plugins {
                let outcome = self.supervise(&name, Hook::Lifecycle(task)).await;
                if self.halts(&group, &outcome) {
                    break;
                }
            }
        }

        self.report
    }

    /// Hand a merged change batch to every plugin in `scope`.
    ///
    /// Each plugin only sees the paths its own patterns match; hooks with no
    /// matching paths are skipped.
    pub async fn run_on_changes(mut self, changes: &ChangeBatch, scope: &Scope) -> RunReport {
        debug!(
            modified = changes.modified.len(),
            added = changes.added.len(),
            removed = changes.removed.len(),
            "dispatching changes"
        );

        for (group, plugins) in self.registry.scoped(scope) {
            'plugin: for name in plugins {
                let Some(entry) = self.registry.plugin(&name) else {
                    continue;
                };
                let modified = entry.patterns.select(&changes.modified);
                let added = entry.patterns.select(&changes.added);
                let removed = entry.patterns.select(&changes.removed);

                let hooks = [
                    Hook::Modifications(&modified),
                    Hook::Additions(&added),
                    Hook::Removals(&removed),
                ];
                for hook in hooks {
                    if hook.paths().is_empty() {
                        continue;
                    }

                    let outcome = self.supervise(&name, hook).await;
                    if self.halts(&group, &outcome) {
                        break 'plugin;
                    }
                    if matches!(outcome, Outcome::Disabled) {
                        continue 'plugin;
                    }
                }
            }
        }

        self.report
    }

    /// Whether the rest of `group` should be skipped after `outcome`.
    fn halts(&mut self, group: &str, outcome: &Outcome) -> bool {
        if !matches!(outcome, Outcome::Failed) {
            return false;
        }
        let halt = self.registry.group(group).is_some_and(|g| g.halt_on_fail);
        if halt {
            info!(group = %group, "task failed; halting remaining plugins of group");
            self.report.halted.push(group.to_string());
        }
        halt
    }

    async fn supervise(&mut self, name: &str, hook: Hook<'_>) -> Outcome {
        let hook_name = hook.name();
        let Some(entry) = self.registry.plugin_mut(name) else {
            return Outcome::Ok;
        };

        debug!(plugin = %name, hook = hook_name, "calling plugin hook");
        self.report.invoked.push((name.to_string(), hook_name));
        let plugin = entry.plugin.as_mut();
        let result = AssertUnwindSafe(async move { hook.call(plugin).await })
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                Err(WatchrunnerError::Other(anyhow::anyhow!(
                    "panicked: {}",
                    panic_message(payload.as_ref())
                )))
            });

        match result {
            Ok(()) => Outcome::Ok,
            Err(err @ WatchrunnerError::TaskFailed { .. }) => {
                warn!(plugin = %name, hook = hook_name, error = %err, "task failed");
                self.report.failed.push(name.to_string());
                self.notifier.notify(Notification::new(
                    NotificationKind::Failed,
                    format!("{name} failed"),
                    err.to_string(),
                ));
                Outcome::Failed
            }
            Err(err) => {
                error!(
                    plugin = %name,
                    hook = hook_name,
                    error = %err,
                    "plugin raised an error and has been removed"
                );
                self.registry.remove_plugin(name);
                self.report.disabled.push(name.to_string());
                self.notifier.notify(Notification::new(
                    NotificationKind::Failed,
                    format!("{name} disabled"),
                    format!("{hook_name} raised: {err}"),
                ));
                Outcome::Disabled
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        *msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic"
    }
}
