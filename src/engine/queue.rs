// src/engine/queue.rs

//! Multi-producer change queue drained by the control thread.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tracing::trace;

use crate::engine::{ChangeBatch, ControlAction, QueueEntry};
use crate::interactor::{Interactor, NullInteractor};

/// Everything removed from the queue by one [`ChangeQueue::drain_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Drained {
    /// Control actions in arrival order.
    pub actions: Vec<ControlAction>,
    /// All change batches merged in arrival order, duplicates kept.
    pub changes: ChangeBatch,
}

impl Drained {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.changes.is_empty()
    }
}

/// Unbounded queue of [`QueueEntry`]s.
///
/// `push` may be called from any thread (watcher callbacks, signal tasks, the
/// interactive shell); `drain_all` and `wait_pending` belong to the control
/// thread. Entries from a single producer keep their order.
pub struct ChangeQueue {
    entries: Mutex<VecDeque<QueueEntry>>,
    wakeup: Notify,
    interactor: Arc<dyn Interactor>,
}

impl fmt::Debug for ChangeQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeQueue")
            .field("pending", &self.lock().len())
            .finish_non_exhaustive()
    }
}

impl Default for ChangeQueue {
    fn default() -> Self {
        Self::new(Arc::new(NullInteractor))
    }
}

impl ChangeQueue {
    /// `interactor` is sent to the background after every push so the control
    /// thread can take over the terminal.
    pub fn new(interactor: Arc<dyn Interactor>) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            wakeup: Notify::new(),
            interactor,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<QueueEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn interactor(&self) -> &Arc<dyn Interactor> {
        &self.interactor
    }

    /// Enqueue an entry. Never blocks on the consumer.
    pub fn push(&self, entry: impl Into<QueueEntry>) {
        let entry = entry.into();
        trace!(?entry, "queue push");
        self.lock().push_back(entry);
        // Stores a permit if the control thread is not currently waiting.
        self.wakeup.notify_one();
        self.interactor.background();
    }

    pub fn has_pending(&self) -> bool {
        !self.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_pending()
    }

    /// Wait until at least one entry is queued.
    pub async fn wait_pending(&self) {
        while !self.has_pending() {
            self.wakeup.notified().await;
        }
    }

    /// Atomically take every queued entry and split it into actions and one
    /// merged change batch.
    pub fn drain_all(&self) -> Drained {
        let entries: Vec<QueueEntry> = self.lock().drain(..).collect();

        let mut drained = Drained::default();
        for entry in entries {
            match entry {
                QueueEntry::Action(action) => drained.actions.push(action),
                QueueEntry::Changes(batch) => drained.changes.extend(batch),
            }
        }
        drained
    }
}
