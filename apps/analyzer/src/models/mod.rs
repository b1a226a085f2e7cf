pub mod analysis;
pub mod notification;
pub mod upload;

pub use analysis::{AnalysisResponse, AnalysisResult, HealthStatus, Outcome};
pub use notification::{NotificationCategory, NotificationState};
pub use upload::{ResumeFile, UploadRequest};
