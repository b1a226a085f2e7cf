use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Url;

use crate::notification::DEFAULT_DURATION;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/upload_resume";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_PROGRESS_TICK_MS: u64 = 500;

/// Client configuration loaded from environment variables.
/// Every variable has a default; malformed values are errors.
#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: String,
    pub health_url: String,
    pub request_timeout: Duration,
    pub notification_duration: Duration,
    pub progress_tick: Duration,
    pub rust_log: String,
    /// Set when `ANALYZER_HEALTH_URL` was given explicitly.
    health_url_pinned: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let endpoint = lookup("ANALYZER_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let (health_url, health_url_pinned) = match lookup("ANALYZER_HEALTH_URL") {
            Some(url) => (url, true),
            None => (health_url_for(&endpoint)?, false),
        };

        Ok(Config {
            endpoint,
            health_url,
            request_timeout: Duration::from_secs(parse_or(
                &lookup,
                "ANALYZER_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )?),
            notification_duration: Duration::from_millis(parse_or(
                &lookup,
                "NOTIFICATION_DURATION_MS",
                DEFAULT_DURATION.as_millis() as u64,
            )?),
            progress_tick: Duration::from_millis(parse_or(
                &lookup,
                "PROGRESS_TICK_MS",
                DEFAULT_PROGRESS_TICK_MS,
            )?),
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            health_url_pinned,
        })
    }

    /// Points the client at another endpoint. The health URL follows it unless
    /// `ANALYZER_HEALTH_URL` was set.
    pub fn with_endpoint(mut self, endpoint: String) -> Result<Self> {
        let derived = health_url_for(&endpoint)?;
        if !self.health_url_pinned {
            self.health_url = derived;
        }
        self.endpoint = endpoint;
        Ok(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            health_url: "http://127.0.0.1:5000/health".to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            notification_duration: DEFAULT_DURATION,
            progress_tick: Duration::from_millis(DEFAULT_PROGRESS_TICK_MS),
            rust_log: "info".to_string(),
            health_url_pinned: false,
        }
    }
}

/// `/health` on the endpoint's origin.
fn health_url_for(endpoint: &str) -> Result<String> {
    let url = Url::parse(endpoint)
        .with_context(|| format!("Analysis endpoint '{endpoint}' is not a valid URL"))?;
    let health = url
        .join("/health")
        .with_context(|| format!("Cannot derive health URL from '{endpoint}'"))?;
    Ok(health.to_string())
}

fn parse_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<u64> {
    match lookup(key) {
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("{key} must be a non-negative integer, got '{raw}'")),
        None => Ok(default),
    }
}
