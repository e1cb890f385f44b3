// src/engine/mod.rs

//! Event aggregation and dispatch engine.
//!
//! This module ties together:
//! - the change queue shared by the watcher, signal handlers and the shell
//! - the coordinator owning the pause state machine and plugin lifecycle
//! - the single-threaded dispatch loop that drains the queue
//! - the signal router that turns OS signals into queued control actions

use std::path::{Path, PathBuf};

use crate::scope::ScopeRequest;
use crate::types::PauseMode;

/// Paths reported by one filesystem notification burst.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBatch {
    pub modified: Vec<PathBuf>,
    pub added: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
}

impl ChangeBatch {
    pub fn new(modified: Vec<PathBuf>, added: Vec<PathBuf>, removed: Vec<PathBuf>) -> Self {
        Self {
            modified,
            added,
            removed,
        }
    }

    /// Convenience for a batch with only modified paths.
    pub fn modified<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            modified: paths.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.modified.is_empty() && self.added.is_empty() && self.removed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.modified.len() + self.added.len() + self.removed.len()
    }

    /// Every path, modified first, then added, then removed.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.modified
            .iter()
            .chain(self.added.iter())
            .chain(self.removed.iter())
            .map(PathBuf::as_path)
    }

    /// Append `other`'s lists to ours, keeping duplicates.
    pub fn extend(&mut self, other: ChangeBatch) {
        self.modified.extend(other.modified);
        self.added.extend(other.added);
        self.removed.extend(other.removed);
    }
}

/// A symbolic request for the coordinator, queued alongside change batches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlAction {
    Pause(Option<PauseMode>),
    Reload(ScopeRequest),
    RunAll(ScopeRequest),
    Stop,
}

/// One item in the change queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEntry {
    Changes(ChangeBatch),
    Action(ControlAction),
}

impl From<ChangeBatch> for QueueEntry {
    fn from(batch: ChangeBatch) -> Self {
        QueueEntry::Changes(batch)
    }
}

impl From<ControlAction> for QueueEntry {
    fn from(action: ControlAction) -> Self {
        QueueEntry::Action(action)
    }
}

pub mod context;
pub mod coordinator;
pub mod dispatch;
pub mod queue;
pub mod signals;

pub use context::Context;
pub use coordinator::{Coordinator, CoordinatorOptions, Lifecycle};
pub use dispatch::{DispatchLoop, DispatchState};
pub use queue::{ChangeQueue, Drained};
pub use signals::SignalRouter;
