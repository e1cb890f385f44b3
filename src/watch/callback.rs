// src/watch/callback.rs

//! The callback the core hands to the watcher backend.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::engine::{ChangeBatch, Context};
use crate::watch::listener::BatchCallback;
use crate::watch::path_utils::normalize_batch;

/// Normalize, filter and enqueue one burst.
///
/// Runs on the watcher's thread: it only reads the published relevance
/// snapshot and pushes onto the queue, and it never fails.
pub fn handle_batch(ctx: &Context, mut batch: ChangeBatch) {
    normalize_batch(&mut batch, &ctx.watch_dirs);

    let index = ctx.index.load();
    if !index.is_relevant(&batch) {
        trace!(?batch, "no plugin watches these paths; dropping");
        return;
    }

    debug!(
        modified = ?batch.modified,
        added = ?batch.added,
        removed = ?batch.removed,
        "queueing changes"
    );
    ctx.queue.push(batch);
}

/// Build the [`BatchCallback`] for a listener feeding `ctx`.
pub fn change_callback(ctx: Context) -> BatchCallback {
    Arc::new(move |batch| handle_batch(&ctx, batch))
}
