//! The save operation the synchronizer delegates to.
//!
//! Every failure, whatever its cause, surfaces as one [`PersistenceError`];
//! the synchronizer treats them all the same way.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{PersistedResume, SaveResumeRequest};

pub mod http;

pub use http::HttpPersistenceClient;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
#[error("{message}")]
pub struct PersistenceError {
    message: String,
    /// HTTP status when the backend answered. Informational only.
    status: Option<u16>,
    #[source]
    source: Option<BoxError>,
}

impl PersistenceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            source: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }
}

impl From<reqwest::Error> for PersistenceError {
    fn from(e: reqwest::Error) -> Self {
        let message = if e.is_timeout() {
            "save request timed out".to_string()
        } else if e.is_decode() {
            "could not decode save response".to_string()
        } else {
            format!("save request failed: {e}")
        };
        let status = e.status().map(|s| s.as_u16());
        let mut err = PersistenceError::new(message).with_source(e);
        err.status = status;
        err
    }
}

/// Backend save operation. Implement this to point the synchronizer at a
/// different store without touching the session or controller.
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    async fn save(&self, request: &SaveResumeRequest) -> Result<PersistedResume, PersistenceError>;
}
