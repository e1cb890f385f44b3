// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Flags given here override the matching `[config]` values.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::ConfigSection;
use crate::scope::ScopeRequest;

/// Command-line arguments for `watchrunner`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "watchrunner",
    version,
    about = "Run plugin commands when watched files change.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, short = 'c', value_name = "PATH", default_value = "Watchrunner.toml")]
    pub config: PathBuf,

    /// Directory to watch. Repeat to watch several; replaces `watch_dirs`.
    #[arg(long = "watchdir", short = 'w', value_name = "DIR")]
    pub watchdirs: Vec<PathBuf>,

    /// Limit the initial scope to these groups.
    #[arg(long, short = 'g', value_name = "NAME")]
    pub group: Vec<String>,

    /// Limit the initial scope to these plugins. Wins over `--group`.
    #[arg(long, short = 'P', value_name = "NAME")]
    pub plugin: Vec<String>,

    /// Turn notifications off.
    #[arg(long, short = 'n')]
    pub no_notify: bool,

    /// Backend latency in seconds (the poll interval when polling).
    #[arg(long, short = 'l', value_name = "SECONDS")]
    pub latency: Option<f64>,

    /// Use the polling backend.
    #[arg(long, short = 'p')]
    pub force_polling: bool,

    /// Seconds of quiet that end a burst of file events.
    #[arg(long, value_name = "SECONDS")]
    pub wait_for_delay: Option<f64>,

    /// Log every command and force at least `debug` logging.
    #[arg(long, short = 'd')]
    pub debug: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WATCHRUNNER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print groups and plugins, but don't watch.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// Initial current scope from `--group` / `--plugin`.
    pub fn scope_request(&self) -> ScopeRequest {
        ScopeRequest {
            groups: self.group.clone(),
            plugins: self.plugin.clone(),
        }
    }

    /// Apply the flags that override `[config]`.
    pub fn apply_overrides(&self, section: &mut ConfigSection) {
        if !self.watchdirs.is_empty() {
            section.watch_dirs = self.watchdirs.clone();
        }
        if let Some(latency) = self.latency {
            section.latency = latency;
        }
        if let Some(wait) = self.wait_for_delay {
            section.wait_for_delay = wait;
        }
        if self.force_polling {
            section.force_polling = true;
        }
        if self.no_notify {
            section.notify = false;
        }
        if self.debug {
            section.debug = true;
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
