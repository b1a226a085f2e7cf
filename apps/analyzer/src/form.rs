//! Upload form controller.
//!
//! Owns file selection, drag state, validation errors and the submission
//! lifecycle. State is published through a `watch` channel so a view can
//! redraw on every change; the notification banner is driven from here when a
//! result arrives.

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::client::AnalysisBackend;
use crate::errors::SubmitError;
use crate::models::analysis::AnalysisResult;
use crate::models::upload::{ResumeFile, UploadRequest};
use crate::notification::NotificationBanner;
use crate::scheduler::TaskHandle;
use crate::validation::{self, FieldErrors};

pub const PROGRESS_STEP: u8 = 10;
/// Simulated progress never passes this until the response arrives.
pub const PROGRESS_CEILING: u8 = 90;
pub const PROGRESS_COMPLETE: u8 = 100;
pub const DEFAULT_PROGRESS_TICK: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub is_submitting: bool,
    pub progress: u8,
    pub selected_file: Option<ResumeFile>,
    pub job_description: String,
    pub drag_active: bool,
    pub field_errors: FieldErrors,
    pub result: Option<AnalysisResult>,
    pub submission_id: Option<Uuid>,
}

struct FormInner {
    backend: Arc<dyn AnalysisBackend>,
    banner: NotificationBanner,
    // Shared with the progress task; the task never holds `FormInner`, so
    // dropping the last form handle also drops and aborts the task.
    state: Arc<watch::Sender<FormState>>,
    progress_tick: Duration,
    progress_task: Mutex<Option<TaskHandle>>,
}

impl FormInner {
    fn start_progress(&self) {
        let state = Arc::clone(&self.state);
        let task = TaskHandle::every(self.progress_tick, move || {
            let mut reached_ceiling = false;
            state.send_if_modified(|s| {
                if s.progress >= PROGRESS_CEILING {
                    reached_ceiling = true;
                    return false;
                }
                s.progress = (s.progress + PROGRESS_STEP).min(PROGRESS_CEILING);
                reached_ceiling = s.progress >= PROGRESS_CEILING;
                debug!(progress = s.progress, "Upload progress");
                true
            });
            if reached_ceiling {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        *self.lock_progress() = Some(task);
    }

    fn stop_progress(&self) {
        if let Some(mut task) = self.lock_progress().take() {
            task.cancel();
        }
    }

    fn lock_progress(&self) -> std::sync::MutexGuard<'_, Option<TaskHandle>> {
        self.progress_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the in-flight flag however the submission ends, including when the
/// submitting future is dropped before the response arrives.
struct InFlightGuard<'a> {
    form: &'a FormInner,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.form.stop_progress();
        self.form.state.send_modify(|s| s.is_submitting = false);
    }
}

#[derive(Clone)]
pub struct UploadForm {
    inner: Arc<FormInner>,
}

impl UploadForm {
    pub fn new(backend: Arc<dyn AnalysisBackend>, banner: NotificationBanner) -> Self {
        let (state, _) = watch::channel(FormState::default());
        Self {
            inner: Arc::new(FormInner {
                backend,
                banner,
                state: Arc::new(state),
                progress_tick: DEFAULT_PROGRESS_TICK,
                progress_task: Mutex::new(None),
            }),
        }
    }

    /// Overrides the simulated progress period. Call before sharing the form.
    pub fn with_progress_tick(self, tick: Duration) -> Self {
        match Arc::try_unwrap(self.inner) {
            Ok(mut inner) => {
                inner.progress_tick = tick;
                Self {
                    inner: Arc::new(inner),
                }
            }
            Err(inner) => {
                warn!("Progress tick not changed: form is already shared");
                Self { inner }
            }
        }
    }

    pub fn state(&self) -> FormState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FormState> {
        self.inner.state.subscribe()
    }

    pub fn banner(&self) -> &NotificationBanner {
        &self.inner.banner
    }

    pub fn notification_visible(&self) -> bool {
        self.inner.banner.is_visible()
    }

    pub fn is_submitting(&self) -> bool {
        self.inner.state.borrow().is_submitting
    }

    /// Replaces the selection unconditionally. Rules are checked at submit time.
    pub fn select_file(&self, file: ResumeFile) {
        debug!(file = %file.name, bytes = file.size(), "Resume selected");
        self.inner.state.send_modify(|s| {
            s.selected_file = Some(file);
            s.field_errors.resume.clear();
        });
    }

    pub fn set_job_description(&self, text: impl Into<String>) {
        let text = text.into();
        self.inner.state.send_modify(|s| {
            s.job_description = text;
            s.field_errors.job_description.clear();
        });
    }

    pub fn drag_enter(&self) {
        self.set_drag_active(true);
    }

    pub fn drag_over(&self) {
        self.set_drag_active(true);
    }

    pub fn drag_leave(&self) {
        self.set_drag_active(false);
    }

    /// A drop ends the drag and selects the first dropped file, if any.
    pub fn drop_file(&self, file: Option<ResumeFile>) {
        self.set_drag_active(false);
        if let Some(file) = file {
            self.select_file(file);
        }
    }

    /// Validates the current inputs and submits them. Validation failures are
    /// recorded as field errors and no request is made.
    pub async fn submit_form(&self) -> Result<AnalysisResult, SubmitError> {
        let (file, job_description) = {
            let state = self.inner.state.borrow();
            (state.selected_file.clone(), state.job_description.clone())
        };

        match validation::build_request(file, job_description) {
            Ok(request) => self.submit(request).await,
            Err(errors) => {
                info!("Submission blocked by validation: {errors}");
                self.record_field_errors(errors.clone());
                Err(SubmitError::Invalid(errors))
            }
        }
    }

    /// Runs one submission. The request is assumed valid.
    ///
    /// Transport and service failures produce a failed `AnalysisResult`
    /// rather than an error; only a concurrent submission is refused.
    pub async fn submit(&self, request: UploadRequest) -> Result<AnalysisResult, SubmitError> {
        let submission_id = Uuid::new_v4();
        let started = self.inner.state.send_if_modified(|s| {
            if s.is_submitting {
                return false;
            }
            s.is_submitting = true;
            s.progress = 0;
            s.result = None;
            s.field_errors = FieldErrors::default();
            s.submission_id = Some(submission_id);
            true
        });
        if !started {
            warn!("Submission refused: another one is in flight");
            return Err(SubmitError::InFlight);
        }

        let _guard = InFlightGuard { form: &*self.inner };
        info!(%submission_id, file = %request.file.name, "Submission started");
        self.inner.start_progress();

        let result = match self.inner.backend.analyze(&request).await {
            Ok(response) => {
                self.inner.stop_progress();
                self.inner
                    .state
                    .send_modify(|s| s.progress = PROGRESS_COMPLETE);
                let result = AnalysisResult::from_response(&response);
                info!(
                    %submission_id,
                    outcome = ?result.outcome,
                    skills = result.skills.len(),
                    suggestions = result.suggestions.len(),
                    score = result.match_score,
                    "Analysis received"
                );
                result
            }
            Err(e) => {
                self.inner.stop_progress();
                error!(%submission_id, "Error uploading resume: {e}");
                AnalysisResult::failure(e.to_string())
            }
        };

        self.inner
            .state
            .send_modify(|s| s.result = Some(result.clone()));
        self.inner
            .banner
            .show(result.status.clone(), result.outcome.category());

        Ok(result)
    }

    fn set_drag_active(&self, active: bool) {
        self.inner.state.send_if_modified(|s| {
            let changed = s.drag_active != active;
            s.drag_active = active;
            changed
        });
    }

    fn record_field_errors(&self, errors: FieldErrors) {
        self.inner.state.send_modify(|s| s.field_errors = errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientError;
    use crate::models::analysis::{AnalysisResponse, Outcome, STATUS_COMPLETED};
    use crate::models::notification::NotificationCategory;
    use crate::models::upload::MIME_PDF;
    use crate::validation::MSG_FILE_TOO_LARGE;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Reply {
        Ok(AnalysisResponse),
        Reject(u16, &'static str),
    }

    struct FakeBackend {
        delay: Duration,
        reply: Reply,
        calls: AtomicUsize,
    }

    impl FakeBackend {
        fn new(delay: Duration, reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                delay,
                reply,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AnalysisBackend for FakeBackend {
        async fn analyze(&self, _request: &UploadRequest) -> Result<AnalysisResponse, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            match &self.reply {
                Reply::Ok(response) => Ok(response.clone()),
                Reply::Reject(status, message) => Err(ClientError::Rejected {
                    status: *status,
                    message: message.to_string(),
                }),
            }
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn pdf(size: usize) -> ResumeFile {
        ResumeFile::new("resume.pdf", MIME_PDF, vec![0u8; size])
    }

    fn success() -> Reply {
        Reply::Ok(AnalysisResponse {
            status: "success".into(),
            skills: vec!["Rust".into(), "SQL".into()],
            suggestions: vec!["Add metrics".into()],
            match_score: Some(81.0),
            ..Default::default()
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_scenario() {
        let backend = FakeBackend::new(ms(6000), success());
        let form = UploadForm::new(backend.clone(), NotificationBanner::default());
        form.select_file(pdf(1024 * 1024));
        form.set_job_description("a".repeat(50));

        let task = tokio::spawn({
            let form = form.clone();
            async move { form.submit_form().await }
        });

        tokio::time::sleep(ms(1)).await;
        let state = form.state();
        assert!(state.is_submitting);
        assert_eq!(state.progress, 0);
        assert!(state.result.is_none());

        for expected in (10..=90).step_by(10) {
            tokio::time::sleep(ms(500)).await;
            assert_eq!(form.state().progress, expected);
        }

        // Ceiling holds while the call is still pending.
        tokio::time::sleep(ms(1000)).await;
        assert_eq!(form.state().progress, PROGRESS_CEILING);
        assert!(form.is_submitting());

        let result = task.await.unwrap().unwrap();
        assert_eq!(result.status, STATUS_COMPLETED);
        assert_eq!(result.skills, vec!["Rust", "SQL"]);
        assert_eq!(result.match_score, 81.0);

        let state = form.state();
        assert_eq!(state.progress, PROGRESS_COMPLETE);
        assert!(!state.is_submitting);
        assert_eq!(state.result, Some(result));
        assert!(form.notification_visible());
        assert_eq!(form.banner().state().category, NotificationCategory::Success);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_scenario() {
        let backend = FakeBackend::new(ms(1200), Reply::Reject(500, "Internal server error"));
        let form = UploadForm::new(backend, NotificationBanner::default());
        form.select_file(pdf(2048));
        form.set_job_description("Data engineer");

        let result = form.submit_form().await.unwrap();

        assert!(result.skills.is_empty());
        assert!(result.suggestions.is_empty());
        assert_eq!(result.match_score, 0.0);
        assert_eq!(
            result.status,
            "Failed to upload resume: Internal server error"
        );
        assert_eq!(result.outcome, Outcome::Failed);

        let state = form.state();
        assert!(!state.is_submitting);
        // Progress stopped where it was when the call failed.
        assert_eq!(state.progress, 20);
        assert!(form.notification_visible());
        assert_eq!(form.banner().state().category, NotificationCategory::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_validation_failure_scenario() {
        let backend = FakeBackend::new(ms(100), success());
        let form = UploadForm::new(backend.clone(), NotificationBanner::default());

        let seen: Arc<Mutex<Vec<FormState>>> = Arc::default();
        let recorder = tokio::spawn({
            let mut updates = form.subscribe();
            let seen = Arc::clone(&seen);
            async move {
                while updates.changed().await.is_ok() {
                    let state = updates.borrow_and_update().clone();
                    seen.lock().unwrap().push(state);
                }
            }
        });
        tokio::task::yield_now().await;

        form.select_file(pdf(6 * 1024 * 1024));
        tokio::task::yield_now().await;
        form.set_job_description("Platform engineer");
        tokio::task::yield_now().await;

        let submission = tokio::spawn({
            let form = form.clone();
            async move { form.submit_form().await }
        });
        let err = submission.await.unwrap().unwrap_err();
        match err {
            SubmitError::Invalid(errors) => {
                assert_eq!(errors.resume_message(), Some(MSG_FILE_TOO_LARGE));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        tokio::task::yield_now().await;
        recorder.abort();

        let seen = seen.lock().unwrap();
        assert!(seen.len() >= 3);
        assert!(seen.iter().all(|s| !s.is_submitting));
        // A submission that started would have stamped an id, even briefly.
        assert!(seen.iter().all(|s| s.submission_id.is_none()));
        assert_eq!(
            seen.last().and_then(|s| s.field_errors.resume_message()),
            Some(MSG_FILE_TOO_LARGE)
        );

        assert_eq!(backend.calls(), 0);
        let state = form.state();
        assert!(!state.is_submitting);
        assert!(state.submission_id.is_none());
        assert_eq!(state.progress, 0);
        assert!(!form.notification_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_status_is_warning() {
        let backend = FakeBackend::new(
            ms(10),
            Reply::Ok(AnalysisResponse {
                status: "error".into(),
                ..Default::default()
            }),
        );
        let form = UploadForm::new(backend, NotificationBanner::default());
        let request = UploadRequest {
            file: pdf(10),
            job_description: "x".into(),
        };

        let result = form.submit(request).await.unwrap();
        assert_eq!(result.status, "Failed to analyze resume");
        assert_eq!(form.banner().state().category, NotificationCategory::Warning);
        assert_eq!(form.state().progress, PROGRESS_COMPLETE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_submission_refused_while_in_flight() {
        let backend = FakeBackend::new(ms(2000), success());
        let form = UploadForm::new(backend.clone(), NotificationBanner::default());
        form.select_file(pdf(10));
        form.set_job_description("x");

        let first = tokio::spawn({
            let form = form.clone();
            async move { form.submit_form().await }
        });
        tokio::time::sleep(ms(1)).await;

        let second = form.submit_form().await;
        assert!(matches!(second, Err(SubmitError::InFlight)));
        // The refused attempt must not clear the running one.
        assert!(form.is_submitting());

        assert!(first.await.unwrap().is_ok());
        assert_eq!(backend.calls(), 1);
        assert!(!form.is_submitting());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_submission_clears_previous_result() {
        let backend = FakeBackend::new(ms(1000), success());
        let form = UploadForm::new(backend, NotificationBanner::default());
        form.select_file(pdf(10));
        form.set_job_description("x");
        form.submit_form().await.unwrap();
        assert!(form.state().result.is_some());

        let task = tokio::spawn({
            let form = form.clone();
            async move { form.submit_form().await }
        });
        tokio::time::sleep(ms(1)).await;
        let state = form.state();
        assert!(state.result.is_none());
        assert_eq!(state.progress, 0);
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_submission_resets_flag() {
        let backend = FakeBackend::new(ms(10_000), success());
        let form = UploadForm::new(backend, NotificationBanner::default());
        form.select_file(pdf(10));
        form.set_job_description("x");

        let task = tokio::spawn({
            let form = form.clone();
            async move { form.submit_form().await }
        });
        tokio::time::sleep(ms(1200)).await;
        assert_eq!(form.state().progress, 20);

        task.abort();
        let _ = task.await;
        assert!(!form.is_submitting());

        // The progress task went with it.
        tokio::time::sleep(ms(2000)).await;
        assert_eq!(form.state().progress, 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_progress_tick() {
        let backend = FakeBackend::new(ms(350), success());
        let form = UploadForm::new(backend, NotificationBanner::default())
            .with_progress_tick(ms(100));
        form.select_file(pdf(10));
        form.set_job_description("x");

        let task = tokio::spawn({
            let form = form.clone();
            async move { form.submit_form().await }
        });
        tokio::time::sleep(ms(301)).await;
        assert_eq!(form.state().progress, 30);
        task.await.unwrap().unwrap();
    }

    #[test]
    fn test_drag_and_drop_funnels_into_selection() {
        let backend = FakeBackend::new(ms(0), success());
        let form = UploadForm::new(backend, NotificationBanner::default());

        form.drag_enter();
        assert!(form.state().drag_active);
        form.drag_over();
        form.drag_leave();
        assert!(!form.state().drag_active);

        form.drag_enter();
        form.drop_file(Some(pdf(42)));
        let state = form.state();
        assert!(!state.drag_active);
        assert_eq!(state.selected_file.map(|f| f.size()), Some(42));

        form.drop_file(None);
        assert!(form.state().selected_file.is_some());
    }

    #[test]
    fn test_reselecting_clears_file_error() {
        let backend = FakeBackend::new(ms(0), success());
        let form = UploadForm::new(backend, NotificationBanner::default());
        form.record_field_errors(FieldErrors {
            resume: vec![MSG_FILE_TOO_LARGE.into()],
            job_description: vec!["Job description is required".into()],
        });

        form.select_file(pdf(1));
        let errors = form.state().field_errors;
        assert!(errors.resume.is_empty());
        assert_eq!(errors.job_description.len(), 1);
    }
}
