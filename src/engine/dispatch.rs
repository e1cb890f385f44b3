// src/engine/dispatch.rs

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::engine::{ChangeQueue, Coordinator, Drained};
use crate::errors::Result;

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// Waiting for the queue to have something.
    Idle,
    /// Applying one drained set of entries.
    Draining,
}

/// Single consumer of the [`ChangeQueue`].
///
/// Each cycle drains everything queued so far, applies the control actions
/// in arrival order, then forwards the merged change batch. Plugins run
/// synchronously inside the cycle, so the next cycle only starts once they
/// are done.
#[derive(Debug)]
pub struct DispatchLoop {
    coordinator: Coordinator,
    queue: Arc<ChangeQueue>,
    state: DispatchState,
}

impl DispatchLoop {
    pub fn new(coordinator: Coordinator) -> Self {
        let queue = Arc::clone(&coordinator.context().queue);
        Self {
            coordinator,
            queue,
            state: DispatchState::Idle,
        }
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn coordinator_mut(&mut self) -> &mut Coordinator {
        &mut self.coordinator
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Start the coordinator, then drain until it is stopped.
    pub async fn run(mut self) -> Result<()> {
        self.coordinator.start().await?;

        while !self.coordinator.is_stopped() {
            self.queue.wait_pending().await;
            self.run_cycle().await;
        }

        info!("dispatch loop finished");
        Ok(())
    }

    /// Drain the queue once and apply what was in it.
    ///
    /// Returns what was drained. A failing control action is logged and only
    /// aborts itself; a `Stop` ends the cycle without forwarding changes.
    pub async fn run_cycle(&mut self) -> Drained {
        self.state = DispatchState::Draining;
        let drained = self.queue.drain_all();
        debug!(
            actions = drained.actions.len(),
            changes = drained.changes.len(),
            "drain cycle"
        );

        for action in drained.actions.iter().cloned() {
            if let Err(err) = self.coordinator.apply(action.clone()).await {
                error!(?action, error = %err, "control action failed");
            }
            if self.coordinator.is_stopped() {
                self.state = DispatchState::Idle;
                return drained;
            }
        }

        if !drained.changes.is_empty() {
            self.coordinator.run_on_changes(&drained.changes).await;
        }

        self.state = DispatchState::Idle;
        drained
    }
}
