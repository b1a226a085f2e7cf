use std::io::Write;

use super::{RenderError, RenderTarget, ScoreView, SkillsView, SuggestionsView};

const GAUGE_WIDTH: usize = 20;

/// Plain-text rendering for the CLI.
pub struct TerminalView<W: Write> {
    out: W,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RenderTarget for TerminalView<W> {
    fn render_skills(&mut self, view: &SkillsView<'_>) -> Result<(), RenderError> {
        writeln!(self.out, "Detected Skills")?;
        let tags: Vec<String> = view.tags().map(|t| format!("[{t}]")).collect();
        writeln!(self.out, "  {}", tags.join(" "))?;
        Ok(())
    }

    fn render_suggestions(&mut self, view: &SuggestionsView<'_>) -> Result<(), RenderError> {
        writeln!(self.out, "Improvement Suggestions")?;
        for item in view.items() {
            writeln!(self.out, "  - {item}")?;
        }
        Ok(())
    }

    fn render_score(&mut self, view: &ScoreView, _pulsing: bool) -> Result<(), RenderError> {
        let filled = ((view.arc_degrees / 360.0) * GAUGE_WIDTH as f64).round() as usize;
        writeln!(self.out, "Job Match Score")?;
        writeln!(
            self.out,
            "  {:>3}% [{}{}]",
            view.display,
            "#".repeat(filled),
            ".".repeat(GAUGE_WIDTH - filled)
        )?;
        self.out.flush()?;
        Ok(())
    }
}
