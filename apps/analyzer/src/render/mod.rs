// Results display: skills, suggestions and match score.
// Views are pure projections of an AnalysisResult; a RenderTarget decides how
// they are drawn. The only state is the cosmetic score pulse.

pub mod html;
pub mod terminal;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::error;

use crate::models::analysis::AnalysisResult;
use crate::models::notification::NotificationCategory;
use crate::notification::NotificationBanner;
use crate::scheduler::TaskHandle;

pub use html::HtmlFragment;
pub use terminal::TerminalView;

pub const PULSE_DURATION: Duration = Duration::from_millis(300);
const DEGREES_PER_POINT: f64 = 3.6;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("{0}")]
    Target(String),
}

/// One tag per skill, in order. Empty input renders no tags.
#[derive(Debug, Clone, Copy)]
pub struct SkillsView<'a> {
    skills: &'a [String],
}

impl<'a> SkillsView<'a> {
    pub fn new(skills: &'a [String]) -> Self {
        Self { skills }
    }

    pub fn tags(&self) -> impl Iterator<Item = &'a str> {
        self.skills.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

/// One list item per suggestion, in order. Empty input renders an empty list.
#[derive(Debug, Clone, Copy)]
pub struct SuggestionsView<'a> {
    suggestions: &'a [String],
}

impl<'a> SuggestionsView<'a> {
    pub fn new(suggestions: &'a [String]) -> Self {
        Self { suggestions }
    }

    pub fn items(&self) -> impl Iterator<Item = &'a str> {
        self.suggestions.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.suggestions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty()
    }
}

/// Match score projected onto a 0-360 degree circular indicator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreView {
    /// Input clamped to [0, 100]. NaN is treated as 0.
    pub clamped: f64,
    /// `round(clamped)`, the number shown to the user.
    pub display: u8,
    pub arc_degrees: f64,
}

impl ScoreView {
    pub fn new(score: f64) -> Self {
        let clamped = if score.is_nan() {
            0.0
        } else {
            score.clamp(0.0, 100.0)
        };
        Self {
            clamped,
            display: clamped.round() as u8,
            arc_degrees: clamped * DEGREES_PER_POINT,
        }
    }
}

/// Where a results panel draws. Injected by the caller instead of looked up.
pub trait RenderTarget {
    fn render_skills(&mut self, view: &SkillsView<'_>) -> Result<(), RenderError>;
    fn render_suggestions(&mut self, view: &SuggestionsView<'_>) -> Result<(), RenderError>;
    fn render_score(&mut self, view: &ScoreView, pulsing: bool) -> Result<(), RenderError>;
}

/// Tracks the last displayed score and runs the short pulse shown on every
/// change, including the first value.
#[derive(Debug, Default)]
pub struct ScoreIndicator {
    last: Option<f64>,
    pulsing: Arc<AtomicBool>,
    pulse: Option<TaskHandle>,
}

impl ScoreIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scores are compared after normalisation, so NaN repeats like 0 does.
    ///
    /// Must be called from within a tokio runtime.
    pub fn update(&mut self, score: f64) -> ScoreView {
        let view = ScoreView::new(score);
        if self.last != Some(view.clamped) {
            self.last = Some(view.clamped);
            self.pulsing.store(true, Ordering::SeqCst);
            let flag = Arc::clone(&self.pulsing);
            // Replacing the handle aborts a pulse still in progress.
            self.pulse = Some(TaskHandle::after(PULSE_DURATION, async move {
                flag.store(false, Ordering::SeqCst);
            }));
        }
        view
    }

    pub fn is_pulsing(&self) -> bool {
        self.pulsing.load(Ordering::SeqCst)
    }
}

/// Renders results into a target, reporting render failures on the banner
/// instead of propagating them.
pub struct ResultsPanel {
    banner: NotificationBanner,
    score: ScoreIndicator,
}

impl ResultsPanel {
    pub fn new(banner: NotificationBanner) -> Self {
        Self {
            banner,
            score: ScoreIndicator::new(),
        }
    }

    /// Returns false if rendering failed and an error notification was shown.
    ///
    /// Must be called from within a tokio runtime.
    pub fn display<T>(&mut self, result: &AnalysisResult, target: &mut T) -> bool
    where
        T: RenderTarget + ?Sized,
    {
        match self.render(result, target) {
            Ok(()) => true,
            Err(e) => {
                let message = format!("Failed to display analysis results: {e}");
                error!("{message}");
                self.banner.show(message, NotificationCategory::Error);
                false
            }
        }
    }

    pub fn score(&self) -> &ScoreIndicator {
        &self.score
    }

    fn render<T>(&mut self, result: &AnalysisResult, target: &mut T) -> Result<(), RenderError>
    where
        T: RenderTarget + ?Sized,
    {
        target.render_skills(&SkillsView::new(&result.skills))?;
        target.render_suggestions(&SuggestionsView::new(&result.suggestions))?;
        let view = self.score.update(result.match_score);
        target.render_score(&view, self.score.is_pulsing())
    }
}
