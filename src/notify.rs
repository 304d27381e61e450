//! User-facing notification contract.
//!
//! The store and mutator report outcomes through a [`NotificationSink`]
//! rather than by propagating errors across the UI boundary. Sinks are
//! fire-and-forget; nothing in this crate consumes a return value from
//! publishing.

use std::sync::Mutex;

/// Severity of a user-facing alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    Success,
    Error,
}

/// A user-facing alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// Longer explanation shown in the alert body.
    pub description: String,
    pub level: AlertLevel,
    /// Short headline shown as the alert title.
    pub message: String,
}

impl Alert {
    /// Build a success alert.
    pub fn success(description: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            level: AlertLevel::Success,
            message: message.into(),
        }
    }

    /// Build an error alert.
    pub fn error(description: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            level: AlertLevel::Error,
            message: message.into(),
        }
    }
}

/// Destination for user-facing alerts.
///
/// Implementations must not block; publishing happens inside async
/// operations on the session's logical thread.
pub trait NotificationSink: Send + Sync {
    fn publish(&self, alert: Alert);
}

/// Sink that forwards alerts to the `log` facade.
///
/// Useful as a default in headless or CLI contexts where no alert UI
/// exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn publish(&self, alert: Alert) {
        match alert.level {
            AlertLevel::Success => log::info!("{}: {}", alert.message, alert.description),
            AlertLevel::Error => log::error!("{}: {}", alert.message, alert.description),
        }
    }
}

/// Sink that records alerts in memory for later inspection.
///
/// Intended for tests asserting on exactly which alerts an operation
/// emitted.
#[derive(Debug, Default)]
pub struct RecordingSink {
    alerts: Mutex<Vec<Alert>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All alerts published so far, in order.
    pub fn published(&self) -> Vec<Alert> {
        self.alerts.lock().expect("alert lock poisoned").clone()
    }

    /// Number of alerts published at the given level.
    pub fn count_at(&self, level: AlertLevel) -> usize {
        self.alerts
            .lock()
            .expect("alert lock poisoned")
            .iter()
            .filter(|alert| alert.level == level)
            .count()
    }

    /// Drop all recorded alerts.
    pub fn clear(&self) {
        self.alerts.lock().expect("alert lock poisoned").clear();
    }
}

impl NotificationSink for RecordingSink {
    fn publish(&self, alert: Alert) {
        self.alerts.lock().expect("alert lock poisoned").push(alert);
    }
}
