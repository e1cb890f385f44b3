// src/engine/context.rs

use std::path::PathBuf;
use std::sync::Arc;

use crate::engine::ChangeQueue;
use crate::scope::Scope;
use crate::types::Snapshot;
use crate::watch::relevance::RelevanceIndex;

/// State shared between the control thread and everything that feeds it.
///
/// Cloning is cheap; every clone sees the same queue and snapshots. The
/// plugin registry and the pause state are deliberately absent: only the
/// coordinator, on the control thread, ever touches those.
#[derive(Debug, Clone)]
pub struct Context {
    pub queue: Arc<ChangeQueue>,
    /// Patterns the watcher thread checks batches against.
    pub index: Snapshot<RelevanceIndex>,
    /// Scope used when an operation does not name one. Set by the shell or
    /// the command line, read by the control thread.
    pub scope: Snapshot<Scope>,
    /// Watch dirs in configured order, used to relativize event paths.
    pub watch_dirs: Arc<Vec<PathBuf>>,
}

impl Context {
    pub fn new(queue: Arc<ChangeQueue>, watch_dirs: Vec<PathBuf>) -> Self {
        Self {
            queue,
            index: Snapshot::default(),
            scope: Snapshot::default(),
            watch_dirs: Arc::new(watch_dirs),
        }
    }

    pub fn current_scope(&self) -> Arc<Scope> {
        self.scope.load()
    }

    /// Replace the current scope as a whole.
    pub fn set_scope(&self, scope: Scope) {
        self.scope.store(scope);
    }
}
