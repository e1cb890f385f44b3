// src/interactor.rs

//! Seam for an interactive command shell.
//!
//! The shell itself lives outside this crate. The engine only needs two
//! things from it: to step aside whenever new work is queued, and to take
//! over interrupt handling.

use tracing::info;

use crate::engine::{ChangeQueue, ControlAction};

pub trait Interactor: Send + Sync {
    /// Give the terminal back to the control thread. Called after every queue
    /// push, from whichever thread pushed.
    fn background(&self);

    /// React to an interrupt signal immediately, outside the drain cycle.
    fn handle_interrupt(&self, queue: &ChangeQueue);
}

/// Used when no interactive shell is attached.
///
/// An interrupt queues a `Stop` so the plugins' stop hooks still run on the
/// control thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullInteractor;

impl Interactor for NullInteractor {
    fn background(&self) {}

    fn handle_interrupt(&self, queue: &ChangeQueue) {
        info!("interrupt received; shutting down");
        queue.push(ControlAction::Stop);
    }
}
