// src/watch/listener.rs

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use globset::GlobSet;
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::ChangeBatch;
use crate::errors::{Result, WatchrunnerError};
use crate::watch::path_utils::relativize;
use crate::watch::patterns::build_globset;

/// Called once per debounced burst with absolute paths.
pub type BatchCallback = Arc<dyn Fn(ChangeBatch) + Send + Sync>;

/// Backend tuning, passed through from `[config]` and the CLI.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub dirs: Vec<PathBuf>,
    /// Poll interval when `force_polling` is set.
    pub latency: Duration,
    /// Quiet period that ends a burst.
    pub wait_for_delay: Duration,
    pub force_polling: bool,
    /// Globs relative to a watch dir; matching paths never reach the callback.
    pub ignore: Vec<String>,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            dirs: vec![PathBuf::from(".")],
            latency: Duration::from_millis(250),
            wait_for_delay: Duration::from_millis(100),
            force_polling: false,
            ignore: Vec::new(),
        }
    }
}

/// Something that can be switched on and off to deliver change batches.
pub trait Listener: Send {
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
    fn is_running(&self) -> bool;
}

/// [`Listener`] backed by the `notify` crate.
///
/// The notify callback forwards raw events into a Tokio task, which groups
/// them into bursts and hands each burst to the [`BatchCallback`]. Stopping
/// drops the backend watcher; starting builds a new one.
pub struct NotifyListener {
    options: WatchOptions,
    event_tx: mpsc::UnboundedSender<Event>,
    inner: Option<Box<dyn Watcher + Send>>,
    flusher: JoinHandle<()>,
}

impl std::fmt::Debug for NotifyListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyListener")
            .field("options", &self.options)
            .field("running", &self.inner.is_some())
            .finish_non_exhaustive()
    }
}

impl NotifyListener {
    /// Must be called from within a Tokio runtime.
    ///
    /// Watch dirs are canonicalized here; a missing dir is an error.
    pub fn new(mut options: WatchOptions, callback: BatchCallback) -> Result<Self> {
        let mut dirs = Vec::with_capacity(options.dirs.len());
        for dir in &options.dirs {
            let canon = dir
                .canonicalize()
                .map_err(|_| WatchrunnerError::WatchDir(dir.clone()))?;
            if !canon.is_dir() {
                return Err(WatchrunnerError::WatchDir(dir.clone()));
            }
            dirs.push(canon);
        }
        options.dirs = dirs;

        let ignore = build_globset(&options.ignore)?;
        let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

        let flusher = tokio::spawn(flush_bursts(
            event_rx,
            options.wait_for_delay,
            options.dirs.clone(),
            ignore,
            callback,
        ));

        Ok(Self {
            options,
            event_tx,
            inner: None,
            flusher,
        })
    }

    /// Canonical watch dirs, in configured order.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.options.dirs
    }

    fn build_watcher(&self) -> Result<Box<dyn Watcher + Send>> {
        let tx = self.event_tx.clone();
        let handler = move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if tx.send(event).is_err() {
                    debug!("burst task gone; dropping notify event");
                }
            }
            Err(err) => warn!(error = %err, "file watch error"),
        };

        let watcher: Box<dyn Watcher + Send> = if self.options.force_polling {
            let config = Config::default().with_poll_interval(self.options.latency);
            Box::new(PollWatcher::new(handler, config)?)
        } else {
            Box::new(RecommendedWatcher::new(handler, Config::default())?)
        };
        Ok(watcher)
    }
}

impl Listener for NotifyListener {
    fn start(&mut self) -> Result<()> {
        if self.inner.is_some() {
            return Ok(());
        }

        let mut watcher = self.build_watcher()?;
        for dir in &self.options.dirs {
            watcher.watch(dir, RecursiveMode::Recursive)?;
        }
        info!(dirs = ?self.options.dirs, polling = self.options.force_polling, "watching");
        self.inner = Some(watcher);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if self.inner.take().is_some() {
            info!("stopped watching");
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.inner.is_some()
    }
}

impl Drop for NotifyListener {
    fn drop(&mut self) {
        self.flusher.abort();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Added,
    Modified,
    Removed,
}

/// Net effect of a burst on each path, in first-seen order.
///
/// `slots` maps a path to its entry in `changes`; an entry whose events
/// cancelled out is `None` and keeps its slot.
#[derive(Debug, Default)]
struct Burst {
    changes: Vec<(PathBuf, Option<Change>)>,
    slots: HashMap<PathBuf, usize>,
}

impl Burst {
    fn record(&mut self, path: PathBuf, change: Change) {
        let Some(&idx) = self.slots.get(&path) else {
            self.slots.insert(path.clone(), self.changes.len());
            self.changes.push((path, Some(change)));
            return;
        };

        let slot = &mut self.changes[idx].1;
        *slot = match (*slot, change) {
            (None, latest) => Some(latest),
            (Some(Change::Added), Change::Removed) => None,
            (Some(Change::Added), _) => Some(Change::Added),
            (Some(Change::Removed), Change::Added) => Some(Change::Modified),
            (Some(_), latest) => Some(latest),
        };
    }

    fn add_event(&mut self, event: Event) {
        let kind = event.kind;
        let mut paths = event.paths.into_iter();

        match kind {
            EventKind::Create(_) => paths.for_each(|p| self.record(p, Change::Added)),
            EventKind::Remove(_) => paths.for_each(|p| self.record(p, Change::Removed)),
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                paths.for_each(|p| self.record(p, Change::Removed))
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                paths.for_each(|p| self.record(p, Change::Added))
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                if let Some(from) = paths.next() {
                    self.record(from, Change::Removed);
                }
                paths.for_each(|p| self.record(p, Change::Added));
            }
            EventKind::Modify(_) | EventKind::Any => {
                paths.for_each(|p| self.record(p, Change::Modified))
            }
            EventKind::Access(_) | EventKind::Other => {}
        }
    }

    fn into_batch(self, dirs: &[PathBuf], ignore: &GlobSet) -> ChangeBatch {
        let mut batch = ChangeBatch::default();
        for (path, change) in self.changes {
            let Some(change) = change else {
                continue;
            };
            let ignored = dirs
                .iter()
                .find_map(|d| relativize(d, &path))
                .is_some_and(|rel| ignore.is_match(&rel));
            if ignored {
                continue;
            }
            match change {
                Change::Added => batch.added.push(path),
                Change::Modified => batch.modified.push(path),
                Change::Removed => batch.removed.push(path),
            }
        }
        batch
    }
}

/// Collect events until `wait` passes without a new one, then flush.
async fn flush_bursts(
    mut rx: mpsc::UnboundedReceiver<Event>,
    wait: Duration,
    dirs: Vec<PathBuf>,
    ignore: GlobSet,
    callback: BatchCallback,
) {
    while let Some(first) = rx.recv().await {
        let mut burst = Burst::default();
        burst.add_event(first);

        let mut closed = false;
        loop {
            match tokio::time::timeout(wait, rx.recv()).await {
                Ok(Some(event)) => burst.add_event(event),
                Ok(None) => {
                    closed = true;
                    break;
                }
                Err(_elapsed) => break,
            }
        }

        let batch = burst.into_batch(&dirs, &ignore);
        if !batch.is_empty() {
            debug!(
                modified = batch.modified.len(),
                added = batch.added.len(),
                removed = batch.removed.len(),
                "burst flushed"
            );
            callback(batch);
        }
        if closed {
            break;
        }
    }
    debug!("burst task finished");
}
