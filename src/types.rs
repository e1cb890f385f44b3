// src/types.rs

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

use crate::errors::WatchrunnerError;

/// Requested transition for the pause state machine.
///
/// A missing mode (`None` at the call site) behaves like `Toggle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseMode {
    Paused,
    Unpaused,
    Toggle,
}

impl FromStr for PauseMode {
    type Err = WatchrunnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "paused" | "pause" => Ok(PauseMode::Paused),
            "unpaused" | "unpause" | "resume" => Ok(PauseMode::Unpaused),
            "toggle" | "" => Ok(PauseMode::Toggle),
            other => Err(WatchrunnerError::InvalidPauseMode(other.to_string())),
        }
    }
}

/// Whether file events are currently being handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PauseState {
    #[default]
    Running,
    Paused,
}

impl PauseState {
    pub fn is_paused(self) -> bool {
        self == PauseState::Paused
    }
}

/// Lifecycle hooks the runner can fan out to plugins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleTask {
    Start,
    Stop,
    Reload,
    RunAll,
}

impl LifecycleTask {
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleTask::Start => "start",
            LifecycleTask::Stop => "stop",
            LifecycleTask::Reload => "reload",
            LifecycleTask::RunAll => "run_all",
        }
    }
}

impl fmt::Display for LifecycleTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value shared between threads that is only ever replaced as a whole.
///
/// Readers get an `Arc` to the value that was current when they asked, so a
/// concurrent `store` never mutates something a reader is still looking at.
#[derive(Debug)]
pub struct Snapshot<T> {
    inner: Arc<RwLock<Arc<T>>>,
}

impl<T> Snapshot<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(value))),
        }
    }

    pub fn load(&self) -> Arc<T> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn store(&self, value: T) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(value);
    }
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Default> Default for Snapshot<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
