// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::{Path, PathBuf};

use crate::engine::ChangeBatch;

/// Render a path with forward slashes, for pattern matching and logging.
pub fn slash_str(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Express `path` relative to `root`.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again. Removed files cannot be
///   canonicalized, so for those only the first attempt applies.
///
/// Returns `None` if the path is not under `root` (or is `root` itself).
pub fn relativize(root: &Path, path: &Path) -> Option<PathBuf> {
    if let Ok(rel) = path.strip_prefix(root) {
        return non_empty(rel);
    }

    // macOS reports events under /private/var/... for a root of /var/...
    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return non_empty(rel);
        }
    }

    None
}

fn non_empty(rel: &Path) -> Option<PathBuf> {
    if rel.as_os_str().is_empty() {
        None
    } else {
        Some(rel.to_path_buf())
    }
}

/// Relativize a single path against the first watch dir that contains it.
///
/// Paths outside every root pass through unchanged.
pub fn normalize_path(path: &Path, roots: &[PathBuf]) -> PathBuf {
    roots
        .iter()
        .find_map(|root| relativize(root, path))
        .unwrap_or_else(|| path.to_path_buf())
}

/// Rewrite every path of `batch` in place to be relative to its watch dir.
///
/// `roots` is checked in the order the watcher was configured with, so the
/// first matching root wins when roots overlap.
pub fn normalize_batch(batch: &mut ChangeBatch, roots: &[PathBuf]) {
    for list in [&mut batch.modified, &mut batch.added, &mut batch.removed] {
        for path in list.iter_mut() {
            *path = normalize_path(path, roots);
        }
    }
}
