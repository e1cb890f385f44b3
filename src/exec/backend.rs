// src/exec/backend.rs

//! Pluggable command execution.
//!
//! - `ShellRunner` is the default implementation used by `watchrunner`. It
//!   runs the command line through the platform shell with `tokio::process`.
//! - `LoggingRunner` wraps any other runner and logs every invocation with
//!   its outcome. It is injected at construction time when debugging is on.
//! - Tests can provide their own `CommandRunner` that records invocations
//!   instead of spawning processes.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Instant;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::Result;

/// A command line plus the environment it should run with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub command: String,
    pub env: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            env: Vec::new(),
            cwd: None,
        }
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

/// How a finished command exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitReport {
    /// Exit code, `-1` when the process was killed by a signal.
    pub code: i32,
}

impl ExitReport {
    pub fn success() -> Self {
        Self { code: 0 }
    }

    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// Trait abstracting how plugin commands are executed.
pub trait CommandRunner: Send + Sync {
    /// Run `spec` to completion.
    ///
    /// Returns `Err` only when the command could not be run at all; a
    /// non-zero exit is reported through [`ExitReport`].
    fn run<'a>(
        &'a self,
        spec: &'a CommandSpec,
    ) -> Pin<Box<dyn Future<Output = Result<ExitReport>> + Send + 'a>>;
}

/// Runs commands through `sh -c` (or `cmd /C` on Windows).
///
/// The child's stdout is inherited so task output reaches the terminal;
/// stderr is forwarded line by line to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run<'a>(
        &'a self,
        spec: &'a CommandSpec,
    ) -> Pin<Box<dyn Future<Output = Result<ExitReport>> + Send + 'a>> {
        Box::pin(async move {
            let mut cmd = if cfg!(windows) {
                let mut c = Command::new("cmd");
                c.arg("/C").arg(&spec.command);
                c
            } else {
                let mut c = Command::new("sh");
                c.arg("-c").arg(&spec.command);
                c
            };

            cmd.envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                .stdout(Stdio::inherit())
                .stderr(Stdio::piped())
                .kill_on_drop(true);
            if let Some(dir) = &spec.cwd {
                cmd.current_dir(dir);
            }

            let mut child = cmd
                .spawn()
                .with_context(|| format!("spawning command '{}'", spec.command))?;

            if let Some(stderr) = child.stderr.take() {
                let command = spec.command.clone();
                tokio::spawn(async move {
                    let mut lines = BufReader::new(stderr).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        info!(cmd = %command, "stderr: {}", line);
                    }
                });
            }

            let status = child
                .wait()
                .await
                .with_context(|| format!("waiting for command '{}'", spec.command))?;

            Ok(ExitReport {
                code: status.code().unwrap_or(-1),
            })
        })
    }
}

/// Decorator that logs every command before and after it runs.
#[derive(Debug, Clone, Default)]
pub struct LoggingRunner<R> {
    inner: R,
}

impl<R: CommandRunner> LoggingRunner<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: CommandRunner> CommandRunner for LoggingRunner<R> {
    fn run<'a>(
        &'a self,
        spec: &'a CommandSpec,
    ) -> Pin<Box<dyn Future<Output = Result<ExitReport>> + Send + 'a>> {
        Box::pin(async move {
            let started = Instant::now();
            debug!(cmd = %spec.command, env = ?spec.env, cwd = ?spec.cwd, "exec");

            let result = self.inner.run(spec).await;

            match &result {
                Ok(exit) => debug!(
                    cmd = %spec.command,
                    code = exit.code,
                    elapsed = ?started.elapsed(),
                    "exec finished"
                ),
                Err(err) => debug!(cmd = %spec.command, error = %err, "exec failed to start"),
            }
            result
        })
    }
}
