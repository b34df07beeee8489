//! Task types shared by the staging list, the scoring client and the renderer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Session-unique task identifier, serialized as a bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(TaskId)
    }
}

/// A staged task, normalized and owned by the [`TaskStore`](crate::TaskStore).
///
/// `due_date` is omitted from the serialized form when absent: the scoring
/// service reads a missing key as "no due date", while `null` or `""` would
/// be rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    pub estimated_hours: f64,
    pub importance: i64,
    #[serde(default)]
    pub dependencies: Vec<i64>,
}

/// A normalized task that has not been given an id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub due_date: Option<String>,
    pub estimated_hours: f64,
    pub importance: i64,
    pub dependencies: Vec<i64>,
}

impl TaskDraft {
    pub fn into_task(self, id: TaskId) -> Task {
        Task {
            id,
            title: self.title,
            due_date: self.due_date,
            estimated_hours: self.estimated_hours,
            importance: self.importance,
            dependencies: self.dependencies,
        }
    }
}

/// Sub-scores reported by the scoring service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub urgency_score: f64,
    pub effort_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency_score: Option<f64>,
}

/// A task as returned by the scoring service. Read-only; lives for one render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredTask {
    #[serde(default)]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default = "default_hours")]
    pub estimated_hours: f64,
    #[serde(default = "default_importance")]
    pub importance: i64,
    #[serde(default)]
    pub dependencies: Vec<i64>,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

fn default_hours() -> f64 {
    crate::normalize::DEFAULT_HOURS
}

fn default_importance() -> i64 {
    crate::normalize::DEFAULT_IMPORTANCE
}

/// Ordering/weighting policy passed to `analyze`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    Default,
    FastestWins,
    HighImpact,
    Deadline,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Default,
        Strategy::FastestWins,
        Strategy::HighImpact,
        Strategy::Deadline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Default => "default",
            Strategy::FastestWins => "fastest_wins",
            Strategy::HighImpact => "high_impact",
            Strategy::Deadline => "deadline",
        }
    }

    /// Label shown in the strategy selector.
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::Default => "Smart Balance",
            Strategy::FastestWins => "Fastest Wins",
            Strategy::HighImpact => "High Impact",
            Strategy::Deadline => "Deadline Driven",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown strategy '{wanted}' (expected one of: default, fastest_wins, high_impact, deadline)"
                )
            })
    }
}

/// How a result list was produced; drives the results container marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultMode {
    Analysis,
    Suggestion,
}

impl ResultMode {
    pub fn from_suggest_flag(is_suggest: bool) -> Self {
        if is_suggest {
            ResultMode::Suggestion
        } else {
            ResultMode::Analysis
        }
    }

    pub fn is_suggest(&self) -> bool {
        matches!(self, ResultMode::Suggestion)
    }
}
