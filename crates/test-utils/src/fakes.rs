#![allow(dead_code)]

//! Test doubles for the seams the coordinator talks through.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use watchrunner::config::ConfigSource;
use watchrunner::errors::{Result, WatchrunnerError};
use watchrunner::exec::{CommandRunner, CommandSpec, ExitReport};
use watchrunner::notifier::{Notification, Notifier};
use watchrunner::plugin::{HookFuture, Plugin, Registry};
use watchrunner::watch::Listener;

/// One recorded hook call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub plugin: String,
    pub hook: &'static str,
    pub paths: Vec<PathBuf>,
}

/// Shared log of hook calls, in call order.
pub type CallLog = Arc<Mutex<Vec<Call>>>;

/// How a [`RecordingPlugin`] hook should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// An ordinary task failure with this exit code.
    Task(i32),
    /// An unexpected error; the runner disables the plugin.
    Crash,
    /// The hook's future panics when polled.
    Panic,
}

/// Plugin that records every hook call into a shared [`CallLog`].
///
/// Hook names match the ones the runner reports: `start`, `stop`, `reload`,
/// `run_all`, `run_on_modifications`, `run_on_additions`, `run_on_removals`.
#[derive(Debug)]
pub struct RecordingPlugin {
    name: String,
    log: CallLog,
    failures: HashMap<&'static str, Failure>,
}

impl RecordingPlugin {
    pub fn new(name: &str, log: CallLog) -> Self {
        Self {
            name: name.to_string(),
            log,
            failures: HashMap::new(),
        }
    }

    pub fn fail_on(mut self, hook: &'static str, failure: Failure) -> Self {
        self.failures.insert(hook, failure);
        self
    }

    fn record<'a>(&'a mut self, hook: &'static str, paths: &'a [PathBuf]) -> HookFuture<'a> {
        self.log.lock().unwrap().push(Call {
            plugin: self.name.clone(),
            hook,
            paths: paths.to_vec(),
        });

        let result = match self.failures.get(hook) {
            None => Ok(()),
            Some(Failure::Panic) => {
                let name = self.name.clone();
                return Box::pin(async move { explode(&name, hook) });
            }
            Some(Failure::Task(code)) => Err(WatchrunnerError::TaskFailed {
                plugin: self.name.clone(),
                hook,
                code: *code,
            }),
            Some(Failure::Crash) => Err(WatchrunnerError::Other(anyhow::anyhow!(
                "{} crashed in {hook}",
                self.name
            ))),
        };
        Box::pin(async move { result })
    }
}

fn explode(name: &str, hook: &'static str) -> Result<()> {
    panic!("{name} panicked in {hook}")
}

impl Plugin for RecordingPlugin {
    fn start(&mut self) -> HookFuture<'_> {
        self.record("start", &[])
    }

    fn stop(&mut self) -> HookFuture<'_> {
        self.record("stop", &[])
    }

    fn reload(&mut self) -> HookFuture<'_> {
        self.record("reload", &[])
    }

    fn run_all(&mut self) -> HookFuture<'_> {
        self.record("run_all", &[])
    }

    fn run_on_modifications<'a>(&'a mut self, paths: &'a [PathBuf]) -> HookFuture<'a> {
        self.record("run_on_modifications", paths)
    }

    fn run_on_additions<'a>(&'a mut self, paths: &'a [PathBuf]) -> HookFuture<'a> {
        self.record("run_on_additions", paths)
    }

    fn run_on_removals<'a>(&'a mut self, paths: &'a [PathBuf]) -> HookFuture<'a> {
        self.record("run_on_removals", paths)
    }
}

/// Shared view of a [`FakeListener`].
#[derive(Debug, Clone, Default)]
pub struct ListenerHandle {
    pub starts: Arc<AtomicUsize>,
    pub stops: Arc<AtomicUsize>,
    pub running: Arc<AtomicBool>,
}

impl ListenerHandle {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Listener that only counts start/stop calls.
#[derive(Debug, Default)]
pub struct FakeListener {
    handle: ListenerHandle,
}

impl FakeListener {
    pub fn new() -> (Self, ListenerHandle) {
        let handle = ListenerHandle::default();
        (
            Self {
                handle: handle.clone(),
            },
            handle,
        )
    }
}

impl Listener for FakeListener {
    fn start(&mut self) -> Result<()> {
        self.handle.starts.fetch_add(1, Ordering::SeqCst);
        self.handle.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.handle.stops.fetch_add(1, Ordering::SeqCst);
        self.handle.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.handle.is_running()
    }
}

/// Shared view of a [`RecordingNotifier`].
#[derive(Debug, Clone, Default)]
pub struct NotifierHandle {
    pub sent: Arc<Mutex<Vec<Notification>>>,
    pub on: Arc<AtomicBool>,
}

impl NotifierHandle {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }
}

/// Notifier that keeps what it would have shown. Drops notifications while
/// turned off, like a real one.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    handle: NotifierHandle,
}

impl RecordingNotifier {
    pub fn new() -> (Self, NotifierHandle) {
        let handle = NotifierHandle::default();
        (
            Self {
                handle: handle.clone(),
            },
            handle,
        )
    }
}

impl Notifier for RecordingNotifier {
    fn turn_on(&mut self) {
        self.handle.on.store(true, Ordering::SeqCst);
    }

    fn turn_off(&mut self) {
        self.handle.on.store(false, Ordering::SeqCst);
    }

    fn is_on(&self) -> bool {
        self.handle.is_on()
    }

    fn notify(&self, notification: Notification) {
        if self.is_on() {
            self.handle.sent.lock().unwrap().push(notification);
        }
    }
}

/// Shared view of a [`StaticConfigSource`].
#[derive(Debug, Clone, Default)]
pub struct SourceHandle {
    pub evaluations: Arc<AtomicUsize>,
    /// While set, evaluation fails with a configuration error.
    pub fail: Arc<AtomicBool>,
}

impl SourceHandle {
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

type RegistryFactory = Box<dyn FnMut() -> Registry + Send>;

/// Config source that builds its registry from a closure.
pub struct StaticConfigSource {
    factory: RegistryFactory,
    config_path: Option<PathBuf>,
    handle: SourceHandle,
}

impl StaticConfigSource {
    pub fn new<F>(factory: F) -> (Self, SourceHandle)
    where
        F: FnMut() -> Registry + Send + 'static,
    {
        let handle = SourceHandle::default();
        (
            Self {
                factory: Box::new(factory),
                config_path: None,
                handle: handle.clone(),
            },
            handle,
        )
    }

    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }
}

impl ConfigSource for StaticConfigSource {
    fn evaluate(&mut self) -> Result<Registry> {
        self.handle.evaluations.fetch_add(1, Ordering::SeqCst);
        if self.handle.fail.load(Ordering::SeqCst) {
            return Err(WatchrunnerError::ConfigError("broken config".to_string()));
        }
        Ok((self.factory)())
    }

    fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

/// Command runner that records specs instead of spawning processes.
///
/// Commands exit 0 unless given another code with [`exit_code`]; a command
/// registered with [`unspawnable`] fails to start.
///
/// [`exit_code`]: RecordingCommandRunner::exit_code
/// [`unspawnable`]: RecordingCommandRunner::unspawnable
#[derive(Debug, Clone, Default)]
pub struct RecordingCommandRunner {
    specs: Arc<Mutex<Vec<CommandSpec>>>,
    codes: Arc<Mutex<HashMap<String, i32>>>,
    broken: Arc<Mutex<Vec<String>>>,
}

impl RecordingCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exit_code(self, command: &str, code: i32) -> Self {
        self.codes.lock().unwrap().insert(command.to_string(), code);
        self
    }

    pub fn unspawnable(self, command: &str) -> Self {
        self.broken.lock().unwrap().push(command.to_string());
        self
    }

    pub fn specs(&self) -> Vec<CommandSpec> {
        self.specs.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.specs().into_iter().map(|s| s.command).collect()
    }
}

impl CommandRunner for RecordingCommandRunner {
    fn run<'a>(
        &'a self,
        spec: &'a CommandSpec,
    ) -> Pin<Box<dyn Future<Output = Result<ExitReport>> + Send + 'a>> {
        self.specs.lock().unwrap().push(spec.clone());

        let result = if self.broken.lock().unwrap().contains(&spec.command) {
            Err(WatchrunnerError::Other(anyhow::anyhow!(
                "cannot spawn '{}'",
                spec.command
            )))
        } else {
            let code = self.codes.lock().unwrap().get(&spec.command).copied().unwrap_or(0);
            Ok(ExitReport { code })
        };
        Box::pin(async move { result })
    }
}
