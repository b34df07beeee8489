//! Markup for the staging list, result cards and the error panel.
//!
//! Rendering is pure: every function takes data and returns a string that
//! the host writes into a slot. Remove buttons carry the task id in a
//! `data-task-id` attribute; the staging container dispatches clicks
//! through [`IntakeController::handle_staging_click`](crate::intake::IntakeController::handle_staging_click).

use std::fmt::Write;

use crate::intake::TASK_ID_ATTR;
use crate::task::{ResultMode, ScoredTask, Task};

pub const EMPTY_STAGING: &str = "No tasks added.";
pub const SUGGESTION_CLASS: &str = "suggestion-mode";

/// Turns task data into slot content.
pub trait Renderer: Send + Sync {
    /// Rows for the staging list.
    fn staging(&self, tasks: &[Task]) -> String;

    /// Result cards, wrapped in a container tagged with the result mode.
    fn results(&self, tasks: &[ScoredTask], mode: ResultMode) -> String;

    /// Content for the error slot when it has no dedicated text element.
    fn error_panel(&self, message: &str) -> String;
}

/// Score band used for the card border.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityBand {
    High,
    Medium,
    Low,
}

impl PriorityBand {
    pub fn for_score(score: f64) -> Self {
        if score >= 80.0 {
            PriorityBand::High
        } else if score >= 50.0 {
            PriorityBand::Medium
        } else {
            PriorityBand::Low
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            PriorityBand::High => "priority-high",
            PriorityBand::Medium => "priority-med",
            PriorityBand::Low => "priority-low",
        }
    }
}

/// Escape text for use in element content and quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Bootstrap-flavoured HTML renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl Renderer for HtmlRenderer {
    fn staging(&self, tasks: &[Task]) -> String {
        if tasks.is_empty() {
            return format!(
                r#"<li class="list-group-item text-center text-muted border-0 py-4"><small>{EMPTY_STAGING}</small></li>"#
            );
        }

        let mut html = String::new();
        for task in tasks {
            let _ = write!(
                html,
                concat!(
                    r#"<li class="list-group-item d-flex justify-content-between align-items-center bg-light mb-2 rounded border-0">"#,
                    r#"<div class="text-truncate me-2">"#,
                    r#"<span class="fw-bold text-dark">{title}</span>"#,
                    r#"<br><small class="text-muted">Imp: {importance} | {hours}h</small>"#,
                    r#"</div>"#,
                    r#"<button type="button" class="btn btn-sm btn-outline-danger border-0" {attr}="{id}">&times;</button>"#,
                    r#"</li>"#
                ),
                title = escape_html(&task.title),
                importance = task.importance,
                hours = task.estimated_hours,
                attr = TASK_ID_ATTR,
                id = task.id,
            );
        }
        html
    }

    fn results(&self, tasks: &[ScoredTask], mode: ResultMode) -> String {
        let wrapper = if mode.is_suggest() { SUGGESTION_CLASS } else { "" };

        let mut cards = String::new();
        for task in tasks {
            let band = PriorityBand::for_score(task.score);
            let due = task
                .due_date
                .as_deref()
                .filter(|d| !d.is_empty())
                .map(escape_html)
                .unwrap_or_else(|| "N/A".to_string());

            let _ = write!(
                cards,
                concat!(
                    r#"<div class="card mb-3 shadow-sm border-0 border-start border-left-lg {band} card-hover fade-in">"#,
                    r#"<div class="card-body">"#,
                    r#"<div class="d-flex justify-content-between align-items-center mb-2">"#,
                    r#"<h5 class="card-title mb-0 text-dark">{title}</h5>"#,
                    r#"<span class="badge bg-light text-dark border fs-6">{score}</span>"#,
                    r#"</div>"#,
                    r#"<div class="d-flex gap-3 small text-secondary mb-2">"#,
                    r#"<span>📅 {due}</span><span>⏱ {hours}h</span><span>⭐ {importance}/10</span>"#,
                    r#"</div>"#,
                    r#"<div class="alert alert-light py-1 px-2 mb-0 small border">"#,
                    r#"<i class="bi bi-info-circle"></i> Urgency: {urgency} | Effort: {effort}"#,
                    r#"</div>"#,
                    r#"</div>"#,
                    r#"</div>"#
                ),
                band = band.css_class(),
                title = escape_html(&task.title),
                score = task.score,
                due = due,
                hours = task.estimated_hours,
                importance = task.importance,
                urgency = task.breakdown.urgency_score.round(),
                effort = task.breakdown.effort_score.round(),
            );
        }

        format!(r#"<div class="{wrapper}">{cards}</div>"#)
    }

    fn error_panel(&self, message: &str) -> String {
        format!(
            r#"<div class="alert alert-danger"><strong>Error:</strong> {}</div>"#,
            escape_html(message)
        )
    }
}
