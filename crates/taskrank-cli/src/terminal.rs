//! Terminal host: a [`Surface`] that prints instead of updating a document,
//! plus plain-text and JSON renderers.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use taskrank_core::render::PriorityBand;
use taskrank_core::{Region, Renderer, ResultMode, ScoredTask, Slot, Surface, Tab, Task};

/// Prints results to stdout and progress/errors to stderr.
#[derive(Debug, Default)]
pub struct TerminalSurface {
    slots: Mutex<HashMap<Slot, String>>,
    tab: Mutex<Tab>,
    /// Print the staging list whenever it changes.
    echo_staging: bool,
}

impl TerminalSurface {
    pub fn new(echo_staging: bool) -> Self {
        Self {
            echo_staging,
            ..Self::default()
        }
    }

    pub fn tab(&self) -> Tab {
        *self.tab.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn staging(&self) -> String {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&Slot::Staging)
            .cloned()
            .unwrap_or_default()
    }
}

impl Surface for TerminalSurface {
    fn has_slot(&self, _slot: Slot) -> bool {
        true
    }

    fn set_slot_html(&self, slot: Slot, html: &str) {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(slot, html.to_string());
    }

    fn set_visible(&self, region: Region, visible: bool) {
        if !visible {
            return;
        }
        match region {
            Region::Loading => eprintln!("scoring..."),
            Region::Results => {
                let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
                if let Some(content) = slots.get(&Slot::Results) {
                    println!("{content}");
                }
            }
            // Printed by set_error_text or set_slot_html.
            Region::Error => {}
        }
    }

    fn set_staging(&self, html: &str, count: usize) {
        self.set_slot_html(Slot::Staging, html);
        if self.echo_staging {
            println!("staged: {count}");
            println!("{html}");
        }
    }

    fn set_error_text(&self, message: &str) -> bool {
        eprintln!("error: {message}");
        true
    }

    fn show_form(&self, tab: Tab) {
        *self.tab.lock().unwrap_or_else(PoisonError::into_inner) = tab;
    }
}

/// Aligned plain-text rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

fn band_label(score: f64) -> &'static str {
    match PriorityBand::for_score(score) {
        PriorityBand::High => "HIGH",
        PriorityBand::Medium => "MED",
        PriorityBand::Low => "LOW",
    }
}

impl Renderer for TextRenderer {
    fn staging(&self, tasks: &[Task]) -> String {
        if tasks.is_empty() {
            return "  No tasks added.".to_string();
        }
        tasks
            .iter()
            .map(|t| {
                format!(
                    "  [{}] {}  (imp {} | {}h)",
                    t.id, t.title, t.importance, t.estimated_hours
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn results(&self, tasks: &[ScoredTask], mode: ResultMode) -> String {
        let heading = match mode {
            ResultMode::Analysis => "Prioritized tasks",
            ResultMode::Suggestion => "Suggested next",
        };
        let mut lines = vec![format!("{heading} ({})", tasks.len())];
        for (rank, t) in tasks.iter().enumerate() {
            lines.push(format!(
                "{:>2}. {:>5.1} {:<4} {}  (due {} | {}h | imp {}/10 | urgency {} | effort {})",
                rank + 1,
                t.score,
                band_label(t.score),
                t.title,
                t.due_date.as_deref().unwrap_or("N/A"),
                t.estimated_hours,
                t.importance,
                t.breakdown.urgency_score.round(),
                t.breakdown.effort_score.round(),
            ));
        }
        lines.join("\n")
    }

    fn error_panel(&self, message: &str) -> String {
        format!("Error: {message}")
    }
}

/// Raw JSON for scripting.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn staging(&self, tasks: &[Task]) -> String {
        serde_json::to_string_pretty(tasks).unwrap_or_else(|_| "[]".to_string())
    }

    fn results(&self, tasks: &[ScoredTask], _mode: ResultMode) -> String {
        serde_json::to_string_pretty(tasks).unwrap_or_else(|_| "[]".to_string())
    }

    fn error_panel(&self, message: &str) -> String {
        serde_json::json!({ "error": message }).to_string()
    }
}
