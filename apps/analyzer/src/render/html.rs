use askama::Template;

use super::{RenderError, RenderTarget, ScoreView, SkillsView, SuggestionsView};

#[derive(Template)]
#[template(
    source = r#"<div class="skills-list">{% for tag in tags %}<span class="skill-tag">{{ tag }}</span>{% endfor %}</div>"#,
    ext = "html"
)]
struct SkillsTemplate<'a> {
    tags: Vec<&'a str>,
}

#[derive(Template)]
#[template(
    source = r#"<ul class="suggestions-list">{% for item in items %}<li class="suggestion-item">{{ item }}</li>{% endfor %}</ul>"#,
    ext = "html"
)]
struct SuggestionsTemplate<'a> {
    items: Vec<&'a str>,
}

#[derive(Template)]
#[template(
    source = r#"<div class="score-circle{% if pulsing %} animate{% endif %}" style="background: conic-gradient(var(--primary-color) {{ deg }}deg, #eee {{ deg }}deg)"><span class="score-value">{{ display }}</span></div>"#,
    ext = "html"
)]
struct ScoreTemplate {
    pulsing: bool,
    deg: f64,
    display: u8,
}

#[derive(Template)]
#[template(
    source = "<section class=\"analysis-results\">\n{{ skills|safe }}\n{{ suggestions|safe }}\n{{ score|safe }}\n</section>",
    ext = "html"
)]
struct ResultsTemplate<'a> {
    skills: &'a str,
    suggestions: &'a str,
    score: &'a str,
}

/// Renders each section into an HTML fragment, replacing the section's previous
/// contents on every call.
#[derive(Debug, Default, Clone)]
pub struct HtmlFragment {
    skills: String,
    suggestions: String,
    score: String,
}

impl HtmlFragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skills(&self) -> &str {
        &self.skills
    }

    pub fn suggestions(&self) -> &str {
        &self.suggestions
    }

    pub fn score(&self) -> &str {
        &self.score
    }

    /// The three sections wrapped in a single results element.
    pub fn to_html(&self) -> Result<String, RenderError> {
        let page = ResultsTemplate {
            skills: &self.skills,
            suggestions: &self.suggestions,
            score: &self.score,
        };
        Ok(page.render()?)
    }
}

impl RenderTarget for HtmlFragment {
    fn render_skills(&mut self, view: &SkillsView<'_>) -> Result<(), RenderError> {
        self.skills = SkillsTemplate {
            tags: view.tags().collect(),
        }
        .render()?;
        Ok(())
    }

    fn render_suggestions(&mut self, view: &SuggestionsView<'_>) -> Result<(), RenderError> {
        self.suggestions = SuggestionsTemplate {
            items: view.items().collect(),
        }
        .render()?;
        Ok(())
    }

    fn render_score(&mut self, view: &ScoreView, pulsing: bool) -> Result<(), RenderError> {
        self.score = ScoreTemplate {
            pulsing,
            deg: view.arc_degrees,
            display: view.display,
        }
        .render()?;
        Ok(())
    }
}
