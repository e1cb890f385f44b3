// src/engine/coordinator.rs

//! Owner of the pause state machine, the plugin registry and the lifecycle.
//!
//! Every method runs on the control thread. Other threads never call into
//! the coordinator; they push [`ControlAction`]s onto the queue instead, and
//! the dispatch loop applies them here.

use std::fmt;

use tracing::{debug, error, info, warn};

use crate::config::ConfigSource;
use crate::engine::{ChangeBatch, Context, ControlAction};
use crate::errors::Result;
use crate::notifier::{Notification, NotificationKind, Notifier};
use crate::plugin::{Registry, RunReport, Runner};
use crate::scope::{self, Scope, ScopeRequest};
use crate::types::{LifecycleTask, PauseMode, PauseState};
use crate::watch::listener::Listener;
use crate::watch::relevance::{ConfigFilePatterns, RelevanceIndex};

/// Where the coordinator is in its overall life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Constructed, `start` not called yet.
    Idle,
    Running,
    /// Terminal; no further events are processed.
    Stopped,
}

/// Startup options that do not come from the registry.
#[derive(Debug, Clone, Default)]
pub struct CoordinatorOptions {
    /// Turn the notifier on at start (already combined with the env override).
    pub notify: bool,
    /// Initial current scope, from `--group` / `--plugin`.
    pub initial_scope: ScopeRequest,
}

pub struct Coordinator {
    ctx: Context,
    registry: Registry,
    source: Box<dyn ConfigSource>,
    listener: Box<dyn Listener>,
    notifier: Box<dyn Notifier>,
    config_files: ConfigFilePatterns,
    options: CoordinatorOptions,
    pause: PauseState,
    lifecycle: Lifecycle,
}

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("registry", &self.registry)
            .field("pause", &self.pause)
            .field("lifecycle", &self.lifecycle)
            .finish_non_exhaustive()
    }
}

impl Coordinator {
    pub fn new(
        ctx: Context,
        source: Box<dyn ConfigSource>,
        listener: Box<dyn Listener>,
        notifier: Box<dyn Notifier>,
        options: CoordinatorOptions,
    ) -> Self {
        let config_files = match source.config_path() {
            Some(path) => ConfigFilePatterns::for_config_file(path, &ctx.watch_dirs),
            None => ConfigFilePatterns::default(),
        };

        Self {
            ctx,
            registry: Registry::new(),
            source,
            listener,
            notifier,
            config_files,
            options,
            pause: PauseState::Running,
            lifecycle: Lifecycle::Idle,
        }
    }

    /// Replace the patterns that identify the config file.
    pub fn with_config_files(mut self, patterns: ConfigFilePatterns) -> Self {
        self.config_files = patterns;
        self
    }

    pub fn pause_state(&self) -> PauseState {
        self.pause
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_stopped(&self) -> bool {
        self.lifecycle == Lifecycle::Stopped
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Load the configuration, resolve the initial scope, run `start` on its
    /// plugins and begin watching.
    pub async fn start(&mut self) -> Result<()> {
        self.registry = self.source.evaluate()?;
        let initial = scope::resolve(&mut self.registry, &self.options.initial_scope)?;
        self.replace_scope(initial);

        if self.options.notify {
            self.notifier.turn_on();
        }

        info!(
            dirs = ?self.ctx.watch_dirs,
            plugins = self.registry.plugins().count(),
            "watchrunner is now watching"
        );
        let current = self.ctx.current_scope();
        self.run_task(LifecycleTask::Start, &current).await;

        self.listener.start()?;
        self.pause = PauseState::Running;
        self.lifecycle = Lifecycle::Running;
        Ok(())
    }

    /// Shut down the plugins of the current scope (the ones `start` ran
    /// on) and stop watching. Calling it again is a no-op.
    pub async fn stop(&mut self) -> Result<()> {
        if self.is_stopped() {
            return Ok(());
        }
        info!("stopping");

        self.notifier.turn_off();
        let current = self.ctx.current_scope();
        self.run_task(LifecycleTask::Stop, &current).await;
        self.lifecycle = Lifecycle::Stopped;
        self.listener.stop()
    }

    /// Move the pause state machine. `None` toggles.
    ///
    /// Asking for the state we are already in issues no listener call.
    pub fn pause(&mut self, mode: Option<PauseMode>) -> Result<()> {
        let target = match mode.unwrap_or(PauseMode::Toggle) {
            PauseMode::Paused => PauseState::Paused,
            PauseMode::Unpaused => PauseState::Running,
            PauseMode::Toggle if self.pause.is_paused() => PauseState::Running,
            PauseMode::Toggle => PauseState::Paused,
        };

        if target == self.pause {
            debug!(state = ?self.pause, "pause request matches current state");
            return Ok(());
        }

        let message = match target {
            PauseState::Paused => {
                self.listener.stop()?;
                "File event handling has been paused"
            }
            PauseState::Running => {
                self.listener.start()?;
                "File event handling has been resumed"
            }
        };
        self.pause = target;

        info!("{message}");
        self.notifier.notify(Notification::new(
            NotificationKind::Pending,
            "watchrunner",
            message,
        ));
        Ok(())
    }

    /// Make `request` the current scope. Only the relevance index follows;
    /// no lifecycle hooks run.
    pub fn set_scope(&mut self, request: &ScopeRequest) -> Result<()> {
        let scope = scope::resolve(&mut self.registry, request)?;
        info!(?scope, "current scope changed");
        self.replace_scope(scope);
        Ok(())
    }

    /// Reload the plugins of a scope, or the whole configuration when the
    /// requested scope is empty.
    pub async fn reload(&mut self, request: &ScopeRequest) -> Result<()> {
        let requested = scope::resolve(&mut self.registry, request)?;
        if requested.is_empty() {
            self.reevaluate().await;
        } else {
            info!(scope = ?requested, "reload");
            self.run_task(LifecycleTask::Reload, &requested).await;
        }
        Ok(())
    }

    /// Run every plugin of a scope (or of the current scope) completely.
    pub async fn run_all(&mut self, request: &ScopeRequest) -> Result<()> {
        let requested = scope::resolve(&mut self.registry, request)?;
        let current = self.ctx.current_scope();
        let scope = requested.or(&current).clone();
        info!(?scope, "run all");
        self.run_task(LifecycleTask::RunAll, &scope).await;
        Ok(())
    }

    /// Hand a merged batch to the plugins of the current scope.
    ///
    /// Edits to the config file reevaluate it first.
    pub async fn run_on_changes(&mut self, changes: &ChangeBatch) {
        if self.config_files.touched_by(changes) {
            info!("configuration file changed");
            self.reevaluate().await;
        }

        let scope = self.ctx.current_scope();
        let report = Runner::new(&mut self.registry, self.notifier.as_ref())
            .run_on_changes(changes, &scope)
            .await;
        self.absorb(report);
    }

    /// Apply one queued control action.
    pub async fn apply(&mut self, action: ControlAction) -> Result<()> {
        debug!(?action, "applying control action");
        match action {
            ControlAction::Pause(mode) => self.pause(mode),
            ControlAction::Reload(request) => self.reload(&request).await,
            ControlAction::RunAll(request) => self.run_all(&request).await,
            ControlAction::Stop => self.stop().await,
        }
    }

    /// Re-read the configuration and swap in the new plugins.
    ///
    /// A configuration that fails to evaluate leaves the running plugins
    /// untouched.
    async fn reevaluate(&mut self) {
        let fresh = match self.source.reevaluate() {
            Ok(registry) => registry,
            Err(err) => {
                error!(error = %err, "failed to re-evaluate configuration; keeping current plugins");
                self.notifier.notify(Notification::new(
                    NotificationKind::Failed,
                    "watchrunner",
                    format!("Failed to re-evaluate configuration: {err}"),
                ));
                return;
            }
        };

        let current = self.ctx.current_scope();
        self.run_task(LifecycleTask::Stop, &current).await;
        self.registry = fresh;
        self.rescope();
        let current = self.ctx.current_scope();
        self.run_task(LifecycleTask::Start, &current).await;

        info!("configuration has been re-evaluated");
        self.notifier.notify(Notification::new(
            NotificationKind::Success,
            "watchrunner",
            "Configuration has been re-evaluated",
        ));
    }

    /// Resolve the current scope's names against a fresh registry.
    fn rescope(&mut self) {
        let current = self.ctx.current_scope();
        let request = ScopeRequest {
            groups: current.groups().to_vec(),
            plugins: current.plugins().to_vec(),
        };
        let scope = scope::resolve(&mut self.registry, &request).unwrap_or_else(|err| {
            warn!(error = %err, "current scope no longer valid; clearing it");
            Scope::all()
        });
        self.replace_scope(scope);
    }

    /// Store a new current scope and republish the index it implies.
    fn replace_scope(&mut self, scope: Scope) {
        self.ctx.set_scope(scope);
        self.publish_index();
    }

    /// Run a lifecycle task on exactly `scope`; an empty scope means every
    /// plugin.
    async fn run_task(&mut self, task: LifecycleTask, scope: &Scope) {
        let report = Runner::new(&mut self.registry, self.notifier.as_ref())
            .run(task, scope)
            .await;
        self.absorb(report);
    }

    fn absorb(&mut self, report: RunReport) {
        if !report.disabled.is_empty() {
            self.publish_index();
        }
    }

    /// Publish the patterns of the plugins in the current scope.
    fn publish_index(&self) {
        let current = self.ctx.current_scope();
        let index = RelevanceIndex::new(
            self.registry.pattern_table(&current),
            self.config_files.clone(),
        );
        self.ctx.index.store(index);
    }
}
