//! Autosave for the resume editor.
//!
//! Watches an in-memory [`ResumeDocument`] and persists it without an
//! explicit save action: edits are debounced, compared against the last
//! saved snapshot, and sent one at a time through a [`PersistenceClient`].
//! Failures raise a notification with a retry action and pause automatic
//! saving until the next edit.
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use std::sync::Arc;
//! use autosave::{AutosaveConfig, AutosaveSession, HttpPersistenceClient, ResumeDocument};
//!
//! let config = AutosaveConfig::from_env()?;
//! let client = HttpPersistenceClient::from_config(&config, uuid::Uuid::new_v4())?;
//! let (document, rx) = tokio::sync::watch::channel(ResumeDocument::default());
//! let session = AutosaveSession::new(rx, Arc::new(client)).with_config(config).spawn();
//!
//! document.send_modify(|doc| doc.content.title = Some("Backend engineer".into()));
//! # drop(session);
//! # Ok(())
//! # }
//! ```

pub mod comparator;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod models;
pub mod notify;
pub mod persistence;
pub mod reconciler;
pub mod session;

#[cfg(test)]
mod testing;

pub use comparator::{changed_fields, is_dirty, photo_unchanged, ResumeField};
pub use config::AutosaveConfig;
pub use controller::{SaveController, SaveOutcome, SaveRequest, SaveState, SkipReason, Trigger};
pub use models::{
    Attachment, Education, PersistedResume, Photo, ResumeContent, ResumeDocument, ResumeId,
    SaveResumeRequest, WorkExperience,
};
pub use notify::{
    Notification, NotificationChannel, NotificationId, RetryAction, RetryBridge, Severity,
    TracingNotifier,
};
pub use persistence::{HttpPersistenceClient, PersistenceClient, PersistenceError};
pub use reconciler::{AddressableReference, EditorLocation, IdentityReconciler, Reconciliation};
pub use session::{AutosaveHandle, AutosaveSession, AutosaveStatus};
