// src/watch/mod.rs

//! File watching and change filtering.
//!
//! This module is responsible for:
//! - Compiling per-plugin `watch` / `watch_regex` / `exclude` patterns.
//! - Wiring up a cross-platform filesystem watcher (`notify`) that delivers
//!   debounced `(modified, added, removed)` bursts.
//! - Relativizing event paths against the watch dirs.
//! - Dropping bursts no active plugin (and not the config file) cares about.
//!
//! It does **not** run plugins; relevant bursts are pushed onto the engine's
//! change queue.

pub mod callback;
pub mod listener;
pub mod path_utils;
pub mod patterns;
pub mod relevance;

pub use callback::{change_callback, handle_batch};
pub use listener::{BatchCallback, Listener, NotifyListener, WatchOptions};
pub use path_utils::{normalize_batch, normalize_path, relativize};
pub use patterns::{PatternSpec, WatchPatterns};
pub use relevance::{is_relevant, ConfigFilePatterns, RelevanceIndex};
