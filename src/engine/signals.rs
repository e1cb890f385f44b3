// src/engine/signals.rs

//! OS signals → control actions.
//!
//! | signal  | effect                                              |
//! |---------|-----------------------------------------------------|
//! | SIGUSR1 | queue `Pause(Paused)`                               |
//! | SIGUSR2 | queue `Pause(Unpaused)`                             |
//! | SIGINT  | hand to the interactor right away, bypassing queue  |
//!
//! Signal tasks only ever push onto the queue or call the interactor; they
//! never touch the coordinator. Where a signal cannot be installed (e.g. no
//! user signals on Windows) that signal is simply not routed.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::engine::{ChangeQueue, ControlAction};
use crate::types::PauseMode;

/// Keeps the signal tasks alive; dropping it uninstalls the routing.
#[derive(Debug, Default)]
pub struct SignalRouter {
    tasks: Vec<JoinHandle<()>>,
}

impl SignalRouter {
    /// Install every handler the platform supports. Must be called from
    /// within a Tokio runtime.
    pub fn install(queue: Arc<ChangeQueue>) -> Self {
        let mut router = Self::default();
        router.install_platform(queue);
        debug!(handlers = router.tasks.len(), "signal handlers installed");
        router
    }

    /// Number of installed handlers.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    #[cfg(unix)]
    fn install_platform(&mut self, queue: Arc<ChangeQueue>) {
        use tokio::signal::unix::{signal, SignalKind};

        let routes = [
            (SignalKind::user_defined1(), "SIGUSR1", Some(PauseMode::Paused)),
            (SignalKind::user_defined2(), "SIGUSR2", Some(PauseMode::Unpaused)),
            (SignalKind::interrupt(), "SIGINT", None),
        ];

        for (kind, name, pause) in routes {
            let mut stream = match signal(kind) {
                Ok(s) => s,
                Err(err) => {
                    warn!(signal = name, error = %err, "cannot install signal handler");
                    continue;
                }
            };

            let queue = Arc::clone(&queue);
            self.tasks.push(tokio::spawn(async move {
                while stream.recv().await.is_some() {
                    debug!(signal = name, "signal received");
                    match pause {
                        Some(mode) => queue.push(ControlAction::Pause(Some(mode))),
                        None => queue.interactor().handle_interrupt(&queue),
                    }
                }
            }));
        }
    }

    #[cfg(not(unix))]
    fn install_platform(&mut self, queue: Arc<ChangeQueue>) {
        self.tasks.push(tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                debug!(signal = "ctrl-c", "signal received");
                queue.interactor().handle_interrupt(&queue);
            }
        }));
    }
}

impl Drop for SignalRouter {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
