/// Analysis client: the only place that talks to the remote analysis endpoint.
///
/// The form controller depends on `AnalysisBackend`, not on reqwest, so the
/// endpoint can be replaced by a fake in tests.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::analysis::{AnalysisResponse, ErrorBody, HealthStatus};
use crate::models::upload::UploadRequest;

pub const FILE_FIELD: &str = "file";
pub const JOB_DESCRIPTION_FIELD: &str = "jobDescription";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to upload resume: {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid response from analysis service: {0}")]
    Decode(#[from] serde_json::Error),
}

#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn analyze(&self, request: &UploadRequest) -> Result<AnalysisResponse, ClientError>;
}

#[derive(Clone)]
pub struct HttpAnalysisClient {
    client: Client,
    endpoint: String,
    health_url: String,
}

impl HttpAnalysisClient {
    pub fn new(
        endpoint: impl Into<String>,
        health_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            endpoint: endpoint.into(),
            health_url: health_url.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        Self::new(
            config.endpoint.clone(),
            config.health_url.clone(),
            config.request_timeout,
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// GET on the service health route.
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let response = self.client.get(&self.health_url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(rejection(status, &body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl AnalysisBackend for HttpAnalysisClient {
    async fn analyze(&self, request: &UploadRequest) -> Result<AnalysisResponse, ClientError> {
        let file = &request.file;
        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.name.clone())
            .mime_str(&file.content_type)?;
        let form = Form::new()
            .part(FILE_FIELD, part)
            .text(JOB_DESCRIPTION_FIELD, request.job_description.clone());

        info!(
            endpoint = %self.endpoint,
            file = %file.name,
            bytes = file.size(),
            "Uploading resume for analysis"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!("Analysis service responded {status}");

        if !status.is_success() {
            warn!("Analysis service returned {status}: {body}");
            return Err(rejection(status, &body));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Uses the service's `{status, message}` error body when present, otherwise
/// the HTTP status line.
fn rejection(status: StatusCode, body: &str) -> ClientError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| status.to_string());
    ClientError::Rejected {
        status: status.as_u16(),
        message,
    }
}
