use thiserror::Error;

use crate::validation::FieldErrors;

/// Why a submission never reached the analysis endpoint.
///
/// Failures after dispatch are not errors here: they come back as a failed
/// `AnalysisResult` so the session always stays usable.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Validation error: {0}")]
    Invalid(#[from] FieldErrors),

    #[error("A submission is already in progress")]
    InFlight,
}

impl SubmitError {
    /// Process exit code used by the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            SubmitError::Invalid(_) => 2,
            SubmitError::InFlight => 3,
        }
    }
}
