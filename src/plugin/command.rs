// src/plugin/command.rs

//! The shell-command plugin built from a `[plugin.<name>]` section.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::{Result, WatchrunnerError};
use crate::exec::{CommandRunner, CommandSpec};
use crate::plugin::{HookFuture, Plugin, done};
use crate::watch::path_utils::slash_str;

/// Placeholder replaced by the (shell-quoted) matched paths.
pub const PATHS_PLACEHOLDER: &str = "{paths}";

/// Command lines for each hook. `None` means the hook does nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSet {
    /// Run on changes; may contain `{paths}`.
    pub changes: Option<String>,
    pub run_all: Option<String>,
    pub start: Option<String>,
    pub stop: Option<String>,
    pub reload: Option<String>,
}

pub struct CommandPlugin {
    name: String,
    commands: CommandSet,
    all_on_start: bool,
    cwd: Option<PathBuf>,
    runner: Arc<dyn CommandRunner>,
}

impl fmt::Debug for CommandPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandPlugin")
            .field("name", &self.name)
            .field("commands", &self.commands)
            .field("all_on_start", &self.all_on_start)
            .finish_non_exhaustive()
    }
}

impl CommandPlugin {
    pub fn new(name: impl Into<String>, commands: CommandSet, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            name: name.into(),
            commands,
            all_on_start: false,
            cwd: None,
            runner,
        }
    }

    /// Run the `run_all` command right after `start`.
    pub fn all_on_start(mut self, enabled: bool) -> Self {
        self.all_on_start = enabled;
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn spec(&self, hook: &'static str, command: &str, paths: &[PathBuf]) -> CommandSpec {
        let rendered: Vec<String> = paths.iter().map(|p| slash_str(p)).collect();
        let line = command.replace(
            PATHS_PLACEHOLDER,
            &rendered.iter().map(|p| shell_quote(p)).collect::<Vec<_>>().join(" "),
        );

        let mut spec = CommandSpec::new(line)
            .env("WATCHRUNNER_PLUGIN", self.name.clone())
            .env("WATCHRUNNER_HOOK", hook)
            .env("WATCHRUNNER_PATHS", rendered.join("\n"));
        if let Some(dir) = &self.cwd {
            spec = spec.cwd(dir.clone());
        }
        spec
    }

    async fn exec(&self, hook: &'static str, command: &str, paths: &[PathBuf]) -> Result<()> {
        let spec = self.spec(hook, command, paths);
        info!(plugin = %self.name, hook, cmd = %spec.command, "running");

        let exit = self.runner.run(&spec).await?;
        if exit.is_success() {
            debug!(plugin = %self.name, hook, "command succeeded");
            Ok(())
        } else {
            Err(WatchrunnerError::TaskFailed {
                plugin: self.name.clone(),
                hook,
                code: exit.code,
            })
        }
    }

    fn hook<'a>(
        &'a self,
        hook: &'static str,
        command: Option<&'a String>,
        paths: &'a [PathBuf],
    ) -> HookFuture<'a> {
        match command {
            Some(command) => Box::pin(self.exec(hook, command, paths)),
            None => done(),
        }
    }
}

impl Plugin for CommandPlugin {
    fn start(&mut self) -> HookFuture<'_> {
        Box::pin(async move {
            if let Some(command) = &self.commands.start {
                self.exec("start", command, &[]).await?;
            }
            if self.all_on_start {
                if let Some(command) = &self.commands.run_all {
                    self.exec("run_all", command, &[]).await?;
                }
            }
            Ok(())
        })
    }

    fn stop(&mut self) -> HookFuture<'_> {
        self.hook("stop", self.commands.stop.as_ref(), &[])
    }

    fn reload(&mut self) -> HookFuture<'_> {
        self.hook("reload", self.commands.reload.as_ref(), &[])
    }

    fn run_all(&mut self) -> HookFuture<'_> {
        self.hook("run_all", self.commands.run_all.as_ref(), &[])
    }

    fn run_on_changes<'a>(&'a mut self, paths: &'a [PathBuf]) -> HookFuture<'a> {
        self.hook("run_on_changes", self.commands.changes.as_ref(), paths)
    }

    fn run_on_additions<'a>(&'a mut self, paths: &'a [PathBuf]) -> HookFuture<'a> {
        self.hook("run_on_additions", self.commands.changes.as_ref(), paths)
    }

    fn run_on_modifications<'a>(&'a mut self, paths: &'a [PathBuf]) -> HookFuture<'a> {
        self.hook("run_on_modifications", self.commands.changes.as_ref(), paths)
    }

    fn run_on_removals<'a>(&'a mut self, paths: &'a [PathBuf]) -> HookFuture<'a> {
        self.hook("run_on_removals", self.commands.changes.as_ref(), paths)
    }
}

/// Single-quote a path for `sh`, unless it only contains safe characters.
fn shell_quote(s: &str) -> String {
    let safe = !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_' | '-' | '+' | ':' | '@'));
    if safe {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}
