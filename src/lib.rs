// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod interactor;
pub mod logging;
pub mod notifier;
pub mod plugin;
pub mod scope;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{build_registry, load_and_validate, ConfigFile, ConfigSection, TomlConfigSource};
use crate::engine::{ChangeQueue, Context, Coordinator, CoordinatorOptions, DispatchLoop, SignalRouter};
use crate::errors::WatchrunnerError;
use crate::exec::{CommandRunner, LoggingRunner, ShellRunner};
use crate::fs::{FileSystem, RealFileSystem};
use crate::interactor::NullInteractor;
use crate::notifier::{notifications_enabled_from_env, LogNotifier};
use crate::scope::Scope;
use crate::watch::{change_callback, NotifyListener, WatchOptions};

/// Configuration as loaded from disk, with CLI overrides applied.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Canonical path of the config file.
    pub config_path: PathBuf,
    /// Directory plugin commands run in.
    pub root_dir: PathBuf,
    pub config: ConfigFile,
    /// `[config]` after CLI overrides.
    pub section: ConfigSection,
}

impl Settings {
    /// Read and validate the config file named by `args`, then let the
    /// flags override `[config]`.
    pub fn load(args: &CliArgs) -> Result<Self> {
        let fs = RealFileSystem;
        let config_path = fs.canonicalize(&args.config).map_err(|_| {
            WatchrunnerError::ConfigError(format!("config file not found: {:?}", args.config))
        })?;
        let config = load_and_validate(&fs, &config_path)?;

        let mut section = config.config_section().clone();
        args.apply_overrides(&mut section);

        Ok(Self {
            root_dir: config_root_dir(&config_path),
            config_path,
            config,
            section,
        })
    }

    /// Backend options, with watch dirs canonicalized.
    pub fn watch_options(&self) -> Result<WatchOptions> {
        let dirs = if self.section.watch_dirs.is_empty() {
            vec![self.root_dir.clone()]
        } else {
            self.section.watch_dirs.clone()
        };

        let mut canonical = Vec::with_capacity(dirs.len());
        for dir in dirs {
            let canon = dir
                .canonicalize()
                .map_err(|_| WatchrunnerError::WatchDir(dir.clone()))?;
            if !canon.is_dir() {
                return Err(WatchrunnerError::WatchDir(dir).into());
            }
            canonical.push(canon);
        }

        Ok(WatchOptions {
            dirs: canonical,
            latency: seconds("latency", self.section.latency)?,
            wait_for_delay: seconds("wait_for_delay", self.section.wait_for_delay)?,
            force_polling: self.section.force_polling,
            ignore: self.section.ignore.clone(),
        })
    }
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - the change queue and the shared context
/// - the watcher backend feeding the queue
/// - the config source, command runner and notifier behind the coordinator
/// - OS signal routing
///
/// and then drives the dispatch loop on the current task until a `Stop` is
/// applied.
pub async fn run(args: CliArgs, settings: Settings) -> Result<()> {
    if args.dry_run {
        print_dry_run(&settings)?;
        return Ok(());
    }

    let options = settings.watch_options()?;

    let queue = Arc::new(ChangeQueue::new(Arc::new(NullInteractor)));
    let ctx = Context::new(Arc::clone(&queue), options.dirs.clone());
    let listener = NotifyListener::new(options, change_callback(ctx.clone()))?;

    let source = TomlConfigSource::new(
        settings.config_path.clone(),
        Arc::new(RealFileSystem),
        command_runner(settings.section.debug),
    )
    .workdir(settings.root_dir.clone());

    let coordinator = Coordinator::new(
        ctx,
        Box::new(source),
        Box::new(listener),
        Box::new(LogNotifier::new()),
        CoordinatorOptions {
            notify: notifications_enabled_from_env(settings.section.notify),
            initial_scope: args.scope_request(),
        },
    );

    let _signals = SignalRouter::install(Arc::clone(&queue));

    info!(config = ?settings.config_path, "starting watchrunner");
    DispatchLoop::new(coordinator).run().await?;
    Ok(())
}

/// `ShellRunner`, wrapped so every command is logged when `debug` is set.
fn command_runner(debug: bool) -> Arc<dyn CommandRunner> {
    if debug {
        Arc::new(LoggingRunner::new(ShellRunner))
    } else {
        Arc::new(ShellRunner)
    }
}

fn seconds(key: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value).map_err(|_| {
        WatchrunnerError::ConfigError(format!(
            "{key} must be a non-negative number of seconds (got {value})"
        ))
        .into()
    })
}

/// Directory containing the config file.
///
/// A bare filename like "Watchrunner.toml" (parent = "") falls back to the
/// current working directory.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Print the groups and plugins the config would register, in run order.
fn print_dry_run(settings: &Settings) -> Result<()> {
    let runner: Arc<dyn CommandRunner> = Arc::new(ShellRunner);
    let registry = build_registry(&settings.config, &runner, Some(&settings.root_dir))?;
    let section = &settings.section;

    println!("watchrunner dry-run");
    println!("  config = {:?}", settings.config_path);
    println!("  watch_dirs = {:?}", section.watch_dirs);
    println!("  latency = {}", section.latency);
    println!("  wait_for_delay = {}", section.wait_for_delay);
    println!("  force_polling = {}", section.force_polling);
    if !section.ignore.is_empty() {
        println!("  ignore = {:?}", section.ignore);
    }
    println!("  notify = {}", section.notify);
    println!();

    for (group, plugins) in registry.scoped(&Scope::all()) {
        let halt = registry.group(&group).is_some_and(|g| g.halt_on_fail);
        println!("group {group}{}:", if halt { " (halt_on_fail)" } else { "" });
        for name in plugins {
            println!("  - {name}");
            let Some(cfg) = settings.config.plugins().get(&name) else {
                continue;
            };
            if !cfg.watch.is_empty() {
                println!("      watch: {:?}", cfg.watch);
            }
            if !cfg.watch_regex.is_empty() {
                println!("      watch_regex: {:?}", cfg.watch_regex);
            }
            if !cfg.exclude.is_empty() {
                println!("      exclude: {:?}", cfg.exclude);
            }
            for (hook, cmd) in [
                ("cmd", &cfg.cmd),
                ("run_all", &cfg.run_all),
                ("start", &cfg.start),
                ("stop", &cfg.stop),
                ("reload", &cfg.reload),
            ] {
                if let Some(cmd) = cmd {
                    println!("      {hook}: {cmd}");
                }
            }
            if cfg.all_on_start {
                println!("      all_on_start: true");
            }
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
