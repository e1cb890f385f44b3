// src/exec/mod.rs

//! Process execution layer.
//!
//! Plugins never spawn processes directly: they go through a
//! [`CommandRunner`], so the way commands are executed (and whether each
//! invocation is logged) is decided once at startup.
//!
//! - [`backend`] provides the `CommandRunner` trait, the `ShellRunner` used in
//!   production, and the `LoggingRunner` decorator enabled by `debug = true`.

pub mod backend;

pub use backend::{CommandRunner, CommandSpec, ExitReport, LoggingRunner, ShellRunner};
