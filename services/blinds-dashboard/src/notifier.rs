//! User-facing notifications and the sinks that receive them

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::state::StateHandle;

/// Severity of a user notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Failure,
}

/// A notification shown to the dashboard user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub timestamp_epoch_ms: u64,
}

impl Notification {
    pub fn success(message: impl Into<String>, timestamp_epoch_ms: u64) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
            timestamp_epoch_ms,
        }
    }

    pub fn failure(message: impl Into<String>, timestamp_epoch_ms: u64) -> Self {
        Self {
            level: NotificationLevel::Failure,
            message: message.into(),
            timestamp_epoch_ms,
        }
    }
}

/// A sink for user notifications.
///
/// Implementations must return promptly; delivery is fire-and-forget from
/// the caller's point of view.
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Get the notifier type name (e.g. "tracing")
    fn type_name(&self) -> &str;

    /// Deliver a notification
    async fn notify(&self, notification: &Notification) -> crate::Result<()>;
}

/// Logs every notification through `tracing`
#[derive(Debug, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    fn type_name(&self) -> &str {
        "tracing"
    }

    async fn notify(&self, notification: &Notification) -> crate::Result<()> {
        match notification.level {
            NotificationLevel::Success => tracing::info!("{}", notification.message),
            NotificationLevel::Failure => tracing::warn!("{}", notification.message),
        }
        Ok(())
    }
}

/// Keeps recent notifications in the shared state so the dashboard page can show them
#[derive(Debug)]
pub struct HistoryNotifier {
    state: StateHandle,
}

impl HistoryNotifier {
    pub fn new(state: StateHandle) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Notifier for HistoryNotifier {
    fn type_name(&self) -> &str {
        "history"
    }

    async fn notify(&self, notification: &Notification) -> crate::Result<()> {
        self.state
            .write()
            .await
            .add_notification(notification.clone());
        Ok(())
    }
}
