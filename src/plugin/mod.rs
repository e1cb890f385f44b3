// src/plugin/mod.rs

//! Plugins, groups, and the runner that fans lifecycle and change calls out
//! to them.
//!
//! - [`registry`] owns every registered group and plugin.
//! - [`runner`] calls hooks on the plugins of a scope and supervises failures.
//! - [`command`] is the shell-command plugin built from `[plugin.<name>]`.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use crate::errors::{Result, WatchrunnerError};

pub mod command;
pub mod registry;
pub mod runner;

pub use command::{CommandPlugin, CommandSet};
pub use registry::{Group, PluginEntry, Registry, DEFAULT_GROUP};
pub use runner::{RunReport, Runner};

/// Future returned by every plugin hook.
pub type HookFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// A hook that has nothing to do.
pub fn done<'a>() -> HookFuture<'a> {
    Box::pin(async { Ok::<(), WatchrunnerError>(()) })
}

/// A registered task with lifecycle hooks.
///
/// All hooks run on the control thread, one plugin at a time. Returning
/// [`WatchrunnerError::TaskFailed`] reports an ordinary task failure; any
/// other error makes the runner disable the plugin.
///
/// The addition/modification/removal hooks default to `run_on_changes`.
pub trait Plugin: Send {
    fn start(&mut self) -> HookFuture<'_> {
        done()
    }

    fn stop(&mut self) -> HookFuture<'_> {
        done()
    }

    fn reload(&mut self) -> HookFuture<'_> {
        done()
    }

    fn run_all(&mut self) -> HookFuture<'_> {
        done()
    }

    fn run_on_changes<'a>(&'a mut self, paths: &'a [PathBuf]) -> HookFuture<'a> {
        let _ = paths;
        done()
    }

    fn run_on_additions<'a>(&'a mut self, paths: &'a [PathBuf]) -> HookFuture<'a> {
        self.run_on_changes(paths)
    }

    fn run_on_modifications<'a>(&'a mut self, paths: &'a [PathBuf]) -> HookFuture<'a> {
        self.run_on_changes(paths)
    }

    fn run_on_removals<'a>(&'a mut self, paths: &'a [PathBuf]) -> HookFuture<'a> {
        self.run_on_changes(paths)
    }
}
