//! User-facing failure notifications with a bound retry action.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::persistence::PersistenceError;

pub const SAVE_FAILED_TITLE: &str = "Error";
pub const SAVE_FAILED_MESSAGE: &str =
    "We could not save your resume. Please try again later or contact support if the problem persists.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationId(pub u64);

/// A callback the user can trigger from a notification.
///
/// It carries no document state. Whoever receives it re-reads the document
/// at the moment it is invoked.
#[derive(Clone)]
pub struct RetryAction(Arc<dyn Fn() + Send + Sync>);

impl RetryAction {
    pub fn new(f: impl Fn() + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn invoke(&self) {
        (self.0)()
    }
}

impl fmt::Debug for RetryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RetryAction")
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub action: Option<RetryAction>,
}

/// Fire-and-forget sink for user notifications (a toast area, a status bar).
pub trait NotificationChannel: Send + Sync {
    fn notify(&self, notification: Notification) -> NotificationId;
    fn dismiss(&self, id: NotificationId);
}

/// Writes notifications to the tracing log. Useful for headless editors.
#[derive(Debug, Default)]
pub struct TracingNotifier {
    next_id: AtomicU64,
}

impl NotificationChannel for TracingNotifier {
    fn notify(&self, notification: Notification) -> NotificationId {
        let id = NotificationId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let retry = if notification.action.is_some() { " [retry]" } else { "" };
        match notification.severity {
            Severity::Info => info!("{}: {}{retry}", notification.title, notification.message),
            Severity::Warning => warn!("{}: {}{retry}", notification.title, notification.message),
            Severity::Error => error!("{}: {}{retry}", notification.title, notification.message),
        }
        id
    }

    fn dismiss(&self, id: NotificationId) {
        info!("notification {} dismissed", id.0);
    }
}

/// Turns save failures into one outstanding notification with a retry action.
pub struct RetryBridge {
    channel: Arc<dyn NotificationChannel>,
    retry: RetryAction,
    outstanding: Option<NotificationId>,
}

impl RetryBridge {
    pub fn new(channel: Arc<dyn NotificationChannel>, retry: RetryAction) -> Self {
        Self {
            channel,
            retry,
            outstanding: None,
        }
    }

    /// Replaces any outstanding failure notification with a fresh one.
    pub fn report_failure(&mut self, err: &PersistenceError) {
        error!("resume save failed: {err}");
        self.clear();
        let id = self.channel.notify(Notification {
            severity: Severity::Error,
            title: SAVE_FAILED_TITLE.to_string(),
            message: SAVE_FAILED_MESSAGE.to_string(),
            action: Some(self.retry.clone()),
        });
        self.outstanding = Some(id);
    }

    pub fn clear(&mut self) {
        if let Some(id) = self.outstanding.take() {
            self.channel.dismiss(id);
        }
    }

    pub fn has_outstanding(&self) -> bool {
        self.outstanding.is_some()
    }
}
