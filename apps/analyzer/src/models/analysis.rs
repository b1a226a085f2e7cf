use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::notification::NotificationCategory;

pub const STATUS_COMPLETED: &str = "Analysis completed successfully";
pub const STATUS_REJECTED: &str = "Failed to analyze resume";

/// Body returned by the analysis endpoint. Only `status` is required; the
/// upload service also reports what it stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub status: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default, alias = "matchScore")]
    pub match_score: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub resume_id: Option<i64>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub upload_timestamp: Option<String>,
    #[serde(default)]
    pub text_preview: Option<String>,
}

/// Error body shape used by the upload service for non-2xx replies.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// How a submission ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Endpoint answered with `status: "success"`.
    Completed,
    /// Endpoint answered 2xx with any other status.
    Rejected,
    /// Transport failure, non-2xx reply or undecodable body.
    Failed,
}

impl Outcome {
    pub fn category(self) -> NotificationCategory {
        match self {
            Outcome::Completed => NotificationCategory::Success,
            Outcome::Rejected => NotificationCategory::Warning,
            Outcome::Failed => NotificationCategory::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub skills: Vec<String>,
    pub suggestions: Vec<String>,
    pub match_score: f64,
    pub status: String,
    pub outcome: Outcome,
    pub text_preview: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl AnalysisResult {
    /// Builds the result from what the endpoint actually returned.
    /// Missing analysis fields degrade to empty lists and a zero score.
    pub fn from_response(response: &AnalysisResponse) -> Self {
        let (status, outcome) = if response.status == "success" {
            (STATUS_COMPLETED, Outcome::Completed)
        } else {
            (STATUS_REJECTED, Outcome::Rejected)
        };

        Self {
            skills: response.skills.clone(),
            suggestions: response.suggestions.clone(),
            match_score: response.match_score.unwrap_or(0.0),
            status: status.to_string(),
            outcome,
            text_preview: response.text_preview.clone(),
            received_at: Utc::now(),
        }
    }

    /// Synthesized locally when the request never produced a usable response.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            skills: Vec::new(),
            suggestions: Vec::new(),
            match_score: 0.0,
            status: message.into(),
            outcome: Outcome::Failed,
            text_preview: None,
            received_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_accepts_camel_case_score() {
        let r: AnalysisResponse =
            serde_json::from_str(r#"{"status":"success","matchScore":72.5}"#).unwrap();
        assert_eq!(r.match_score, Some(72.5));
        assert!(r.skills.is_empty());
    }

    #[test]
    fn test_response_requires_status() {
        assert!(serde_json::from_str::<AnalysisResponse>(r#"{"skills":["Rust"]}"#).is_err());
    }

    #[test]
    fn test_upload_service_body_parses() {
        let body = r#"{
            "status": "success",
            "resume_id": 7,
            "filename": "cv.pdf",
            "file_type": "pdf",
            "upload_timestamp": "2024-03-01T10:00:00",
            "text_preview": "Jane Doe..."
        }"#;
        let r: AnalysisResponse = serde_json::from_str(body).unwrap();
        assert_eq!(r.resume_id, Some(7));
        assert_eq!(r.text_preview.as_deref(), Some("Jane Doe..."));
    }

    #[test]
    fn test_result_taken_from_response_body() {
        let response = AnalysisResponse {
            status: "success".into(),
            skills: vec!["Rust".into(), "SQL".into()],
            suggestions: vec!["Add metrics".into()],
            match_score: Some(64.0),
            ..Default::default()
        };
        let result = AnalysisResult::from_response(&response);
        assert_eq!(result.skills, vec!["Rust", "SQL"]);
        assert_eq!(result.suggestions, vec!["Add metrics"]);
        assert_eq!(result.match_score, 64.0);
        assert_eq!(result.status, STATUS_COMPLETED);
        assert_eq!(result.outcome, Outcome::Completed);
    }

    #[test]
    fn test_non_success_status_is_rejected() {
        let response = AnalysisResponse {
            status: "error".into(),
            ..Default::default()
        };
        let result = AnalysisResult::from_response(&response);
        assert_eq!(result.status, STATUS_REJECTED);
        assert_eq!(result.outcome.category(), NotificationCategory::Warning);
        assert_eq!(result.match_score, 0.0);
    }

    #[test]
    fn test_failure_is_empty() {
        let result = AnalysisResult::failure("Failed to upload resume: boom");
        assert!(result.skills.is_empty());
        assert!(result.suggestions.is_empty());
        assert_eq!(result.match_score, 0.0);
        assert_eq!(result.status, "Failed to upload resume: boom");
        assert_eq!(result.outcome.category(), NotificationCategory::Error);
    }
}
