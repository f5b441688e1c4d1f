use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{PersistenceClient, PersistenceError};
use crate::config::AutosaveConfig;
use crate::models::{PersistedResume, SaveResumeRequest};

const SAVE_PATH: &str = "api/v1/resumes";

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: String,
    message: String,
}

/// Saves resumes through the backend's `POST /api/v1/resumes` endpoint.
#[derive(Clone)]
pub struct HttpPersistenceClient {
    client: Client,
    save_url: Url,
}

impl HttpPersistenceClient {
    pub fn new(base_url: &str, user_id: Uuid, timeout: Duration) -> Result<Self> {
        let mut base = Url::parse(base_url).with_context(|| format!("invalid API URL '{base_url}'"))?;
        // `join` replaces the last path segment unless the base ends in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let mut save_url = base.join(SAVE_PATH).context("failed to build save URL")?;
        save_url
            .query_pairs_mut()
            .append_pair("user_id", &user_id.to_string());

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { client, save_url })
    }

    pub fn from_config(config: &AutosaveConfig, user_id: Uuid) -> Result<Self> {
        Self::new(&config.api_base_url, user_id, config.request_timeout)
    }

    pub fn save_url(&self) -> &Url {
        &self.save_url
    }
}

#[async_trait]
impl PersistenceClient for HttpPersistenceClient {
    async fn save(&self, request: &SaveResumeRequest) -> Result<PersistedResume, PersistenceError> {
        let response = self
            .client
            .post(self.save_url.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorEnvelope>(&body) {
                Ok(envelope) => format!("{} ({})", envelope.error.message, envelope.error.code),
                Err(_) => body,
            };
            warn!("resume save returned {status}: {message}");
            return Err(PersistenceError::new(format!(
                "backend rejected save with status {}: {message}",
                status.as_u16()
            ))
            .with_status(status.as_u16()));
        }

        let record: PersistedResume = response.json().await?;
        debug!("resume {} saved at {}", record.id, record.updated_at);
        Ok(record)
    }
}
