use serde::Serialize;
use thiserror::Error;

use crate::models::upload::{ResumeFile, UploadRequest, MIME_DOC, MIME_DOCX, MIME_PDF};

pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;
pub const MAX_JOB_DESCRIPTION_CHARS: usize = 2000;

pub const ACCEPTED_MIME_TYPES: &[&str] = &[MIME_PDF, MIME_DOC, MIME_DOCX];
pub const ACCEPTED_EXTENSIONS: &[&str] = &[".pdf", ".doc", ".docx"];

pub const MSG_FILE_REQUIRED: &str = "Resume file is required";
pub const MSG_FILE_TOO_LARGE: &str = "File size must be less than 5MB";
pub const MSG_FILE_TYPE: &str = "File must be PDF, DOC, or DOCX";
pub const MSG_JD_REQUIRED: &str = "Job description is required";
pub const MSG_JD_TOO_LONG: &str = "Job description must be less than 2000 characters";

/// Field-level validation messages, in rule order per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[error("{}", self.summary())]
pub struct FieldErrors {
    pub resume: Vec<String>,
    pub job_description: Vec<String>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.resume.is_empty() && self.job_description.is_empty()
    }

    /// The inline message shown next to the resume field.
    pub fn resume_message(&self) -> Option<&str> {
        self.resume.first().map(String::as_str)
    }

    /// The inline message shown next to the job description field.
    pub fn job_description_message(&self) -> Option<&str> {
        self.job_description.first().map(String::as_str)
    }

    fn summary(&self) -> String {
        self.resume_message()
            .into_iter()
            .chain(self.job_description_message())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

pub fn validate_file(file: Option<&ResumeFile>) -> Vec<String> {
    let Some(file) = file else {
        return vec![MSG_FILE_REQUIRED.to_string()];
    };

    let mut errors = Vec::new();
    if file.size() > MAX_FILE_SIZE {
        errors.push(MSG_FILE_TOO_LARGE.to_string());
    }
    if !ACCEPTED_MIME_TYPES.contains(&file.content_type.as_str()) {
        errors.push(MSG_FILE_TYPE.to_string());
    }
    errors
}

/// Length is counted in UTF-16 code units, the way browser form fields count
/// it, so characters outside the Basic Multilingual Plane count twice.
pub fn validate_job_description(text: &str) -> Vec<String> {
    let units = text.encode_utf16().count();
    if units == 0 {
        vec![MSG_JD_REQUIRED.to_string()]
    } else if units > MAX_JOB_DESCRIPTION_CHARS {
        vec![MSG_JD_TOO_LONG.to_string()]
    } else {
        Vec::new()
    }
}

/// Checks both fields independently; one failing field never hides the other.
pub fn validate(file: Option<&ResumeFile>, job_description: &str) -> Result<(), FieldErrors> {
    let errors = FieldErrors {
        resume: validate_file(file),
        job_description: validate_job_description(job_description),
    };
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates and assembles the request that gets dispatched.
pub fn build_request(
    file: Option<ResumeFile>,
    job_description: String,
) -> Result<UploadRequest, FieldErrors> {
    validate(file.as_ref(), &job_description)?;
    match file {
        Some(file) => Ok(UploadRequest {
            file,
            job_description,
        }),
        None => Err(FieldErrors {
            resume: vec![MSG_FILE_REQUIRED.to_string()],
            job_description: Vec::new(),
        }),
    }
}
