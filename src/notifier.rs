// src/notifier.rs

//! User notifications.
//!
//! Desktop backends are out of scope; the default [`LogNotifier`] renders
//! notifications through `tracing`. Whether notifications are on at all is
//! decided once at startup by [`notifications_enabled`].

use tracing::{error, info, warn};

/// Environment variable that can force notifications off.
pub const NOTIFY_ENV: &str = "WATCHRUNNER_NOTIFY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Failed,
    Pending,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
}

impl Notification {
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
        }
    }
}

pub trait Notifier: Send + Sync {
    fn turn_on(&mut self);
    fn turn_off(&mut self);
    fn is_on(&self) -> bool;

    /// Deliver a notification. Implementations drop it while turned off.
    fn notify(&self, notification: Notification);
}

/// Notifier that writes to the log.
#[derive(Debug, Default)]
pub struct LogNotifier {
    on: bool,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Notifier for LogNotifier {
    fn turn_on(&mut self) {
        self.on = true;
    }

    fn turn_off(&mut self) {
        self.on = false;
    }

    fn is_on(&self) -> bool {
        self.on
    }

    fn notify(&self, n: Notification) {
        if !self.on {
            return;
        }
        match n.kind {
            NotificationKind::Failed => error!(title = %n.title, "{}", n.message),
            NotificationKind::Pending => warn!(title = %n.title, "{}", n.message),
            NotificationKind::Success | NotificationKind::Info => {
                info!(title = %n.title, "{}", n.message)
            }
        }
    }
}

/// Combine the `notify` config flag with the environment override.
///
/// `WATCHRUNNER_NOTIFY=false` disables notifications no matter what the
/// configuration says; any other value leaves the flag alone.
pub fn notifications_enabled(config_flag: bool, env_value: Option<&str>) -> bool {
    match env_value {
        Some(v) if v.trim().eq_ignore_ascii_case("false") => false,
        _ => config_flag,
    }
}

/// [`notifications_enabled`] against the real process environment.
pub fn notifications_enabled_from_env(config_flag: bool) -> bool {
    let env = std::env::var(NOTIFY_ENV).ok();
    notifications_enabled(config_flag, env.as_deref())
}
