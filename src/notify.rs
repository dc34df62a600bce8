//! User notification surface
//!
//! The host UI supplies the real toast channel; `TracingNotifier` covers
//! headless use and tests by routing everything through structured logs.

use tracing::{error, info, warn};

/// Severity of a user-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Warning,
    Error,
}

/// A user-facing notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub content: String,
}

impl Notification {
    pub fn success(content: impl Into<String>) -> Self {
        Notification {
            kind: NotificationKind::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Notification {
            kind: NotificationKind::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Notification {
            kind: NotificationKind::Error,
            content: content.into(),
        }
    }
}

/// Notification sink supplied by the host
pub trait Notifier: Send + Sync {
    fn push(&self, note: Notification);
}

/// Notifier that logs through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn push(&self, note: Notification) {
        match note.kind {
            NotificationKind::Success => info!(content = %note.content, "notification"),
            NotificationKind::Warning => warn!(content = %note.content, "notification"),
            NotificationKind::Error => error!(content = %note.content, "notification"),
        }
    }
}
