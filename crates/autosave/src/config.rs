use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(1500);
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Autosave settings. Every field has a default; `from_env` overrides them.
#[derive(Debug, Clone)]
pub struct AutosaveConfig {
    /// Silence required after the last edit before a save is attempted.
    pub quiet_period: Duration,
    pub api_base_url: String,
    /// Applied by the HTTP client; the synchronizer itself never times out a save.
    pub request_timeout: Duration,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            quiet_period: DEFAULT_QUIET_PERIOD,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl AutosaveConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let mut config = Self::default();
        if let Some(ms) = optional_env("AUTOSAVE_QUIET_PERIOD_MS") {
            let ms = ms
                .parse::<u64>()
                .context("AUTOSAVE_QUIET_PERIOD_MS must be a whole number of milliseconds")?;
            config.quiet_period = Duration::from_millis(ms);
        }
        if let Some(url) = optional_env("RESUME_API_URL") {
            config.api_base_url = url;
        }
        if let Some(secs) = optional_env("RESUME_API_TIMEOUT_SECS") {
            let secs = secs
                .parse::<u64>()
                .context("RESUME_API_TIMEOUT_SECS must be a whole number of seconds")?;
            config.request_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn with_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.quiet_period = quiet_period;
        self
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
