//! Weighted task scoring, as performed by the scoring service.
//!
//! Used by [`LocalScoringService`](crate::api::LocalScoringService) so the
//! client can run without a server. Each task gets four normalized
//! sub-scores in `0..=100`:
//!
//! | factor | rule |
//! |--------|------|
//! | urgency | overdue → 100, otherwise `90·e^(−days/7)`; no date → 50 |
//! | importance | `importance × 10` |
//! | effort | `max(0, 100 − 4.2·hours)` |
//! | dependencies | `min(100, 35·log2(blocked + 1))`, 0 if nothing waits on it |
//!
//! The final score is the strategy-weighted sum, rounded to one decimal.

use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

use crate::task::{ScoreBreakdown, ScoredTask, Strategy};

const MAX_TITLE_CHARS: usize = 255;
const DEFAULT_DUE_IN_DAYS: i64 = 7;
const DEPENDENCY_MULTIPLIER: f64 = 35.0;

/// How much each factor contributes to the final score. Sums to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyWeights {
    pub urgency: f64,
    pub importance: f64,
    pub effort: f64,
    pub dependencies: f64,
}

impl StrategyWeights {
    /// Balanced default
    pub fn balanced() -> Self {
        Self {
            urgency: 0.35,
            importance: 0.30,
            effort: 0.15,
            dependencies: 0.20,
        }
    }

    /// Quick wins first
    pub fn fastest_wins() -> Self {
        Self {
            urgency: 0.20,
            importance: 0.15,
            effort: 0.50,
            dependencies: 0.15,
        }
    }

    pub fn high_impact() -> Self {
        Self {
            urgency: 0.20,
            importance: 0.50,
            effort: 0.10,
            dependencies: 0.20,
        }
    }

    pub fn deadline() -> Self {
        Self {
            urgency: 0.50,
            importance: 0.20,
            effort: 0.15,
            dependencies: 0.15,
        }
    }

    pub fn for_strategy(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Default => Self::balanced(),
            Strategy::FastestWins => Self::fastest_wins(),
            Strategy::HighImpact => Self::high_impact(),
            Strategy::Deadline => Self::deadline(),
        }
    }
}

impl Default for StrategyWeights {
    fn default() -> Self {
        Self::balanced()
    }
}

/// A task that passed validation, with service-side defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTask {
    pub id: Option<i64>,
    pub title: String,
    pub due_date: NaiveDate,
    pub estimated_hours: f64,
    pub importance: i64,
    pub dependencies: Vec<i64>,
}

/// Per-task field errors, keyed by position in the submitted list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldErrors {
    pub entries: Vec<(usize, String, String)>,
}

impl FieldErrors {
    fn push(&mut self, index: usize, field: &str, message: impl Into<String>) {
        self.entries.push((index, field.to_string(), message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One line per error, e.g. `Task 2: importance: Ensure this value ...`.
    pub fn summary(&self) -> String {
        self.entries
            .iter()
            .map(|(index, field, message)| format!("Task {}: {field}: {message}", index + 1))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Validate submitted tasks the way the service does, filling defaults.
///
/// # Errors
///
/// Returns every field error found across the list.
pub fn validate_tasks(items: &[Value], today: NaiveDate) -> Result<Vec<ValidatedTask>, FieldErrors> {
    let mut errors = FieldErrors::default();
    let mut tasks = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let Value::Object(obj) = item else {
            errors.push(
                index,
                "non_field_errors",
                format!(
                    "Invalid data. Expected a dictionary, but got {}.",
                    json_type_name(item)
                ),
            );
            continue;
        };
        let before = errors.entries.len();
        let task = validate_one(index, obj, today, &mut errors);
        if errors.entries.len() == before {
            tasks.push(task);
        }
    }

    if errors.is_empty() {
        Ok(tasks)
    } else {
        Err(errors)
    }
}

fn validate_one(
    index: usize,
    obj: &Map<String, Value>,
    today: NaiveDate,
    errors: &mut FieldErrors,
) -> ValidatedTask {
    let id = match obj.get("id") {
        None | Some(Value::Null) => None,
        Some(value) => match as_integer(value) {
            Some(id) => Some(id),
            None => {
                errors.push(index, "id", "A valid integer is required.");
                None
            }
        },
    };

    let title = match obj.get("title") {
        None => {
            errors.push(index, "title", "This field is required.");
            String::new()
        }
        Some(Value::Null) => {
            errors.push(index, "title", "This field may not be null.");
            String::new()
        }
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(_) => {
            errors.push(index, "title", "Not a valid string.");
            String::new()
        }
    };
    if obj.get("title").is_some_and(|v| v.is_string()) && title.is_empty() {
        errors.push(index, "title", "This field may not be blank.");
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        errors.push(
            index,
            "title",
            format!("Ensure this field has no more than {MAX_TITLE_CHARS} characters."),
        );
    }

    let due_date = match obj.get("due_date") {
        None => today + chrono::Duration::days(DEFAULT_DUE_IN_DAYS),
        Some(Value::String(s)) => match NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
            Ok(date) => date,
            Err(_) => {
                errors.push(
                    index,
                    "due_date",
                    "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.",
                );
                today
            }
        },
        Some(Value::Null) => {
            errors.push(index, "due_date", "This field may not be null.");
            today
        }
        Some(_) => {
            errors.push(
                index,
                "due_date",
                "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.",
            );
            today
        }
    };

    let estimated_hours = match obj.get("estimated_hours") {
        None => 1.0,
        Some(value) => match as_number(value) {
            Some(hours) if hours >= 0.0 => hours,
            Some(_) => {
                errors.push(
                    index,
                    "estimated_hours",
                    "Ensure this value is greater than or equal to 0.0.",
                );
                1.0
            }
            None => {
                errors.push(index, "estimated_hours", "A valid number is required.");
                1.0
            }
        },
    };

    let importance = match obj.get("importance") {
        None => 5,
        Some(value) => match as_integer(value) {
            Some(n) if n < 1 => {
                errors.push(
                    index,
                    "importance",
                    "Ensure this value is greater than or equal to 1.",
                );
                5
            }
            Some(n) if n > 10 => {
                errors.push(
                    index,
                    "importance",
                    "Ensure this value is less than or equal to 10.",
                );
                5
            }
            Some(n) => n,
            None => {
                errors.push(index, "importance", "A valid integer is required.");
                5
            }
        },
    };

    let dependencies = match obj.get("dependencies") {
        None => Vec::new(),
        Some(Value::Array(items)) => {
            let parsed: Vec<Option<i64>> = items.iter().map(as_integer).collect();
            if parsed.iter().any(Option::is_none) {
                errors.push(index, "dependencies", "A valid integer is required.");
            }
            parsed.into_iter().flatten().collect()
        }
        Some(other) => {
            errors.push(
                index,
                "dependencies",
                format!(
                    "Expected a list of items but got type \"{}\".",
                    json_type_name(other)
                ),
            );
            Vec::new()
        }
    };

    ValidatedTask {
        id,
        title,
        due_date,
        estimated_hours,
        importance,
        dependencies,
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Find a dependency cycle. Returns the path that closes the loop, e.g.
/// `[1, 2, 1]` for tasks 1 and 2 waiting on each other.
pub fn detect_cycle(tasks: &[ValidatedTask]) -> Option<Vec<i64>> {
    let mut graph: HashMap<i64, &[i64]> = HashMap::new();
    let mut order = Vec::new();
    for task in tasks {
        if let Some(id) = task.id {
            if graph.insert(id, &task.dependencies).is_none() {
                order.push(id);
            }
        }
    }

    // Iterative DFS: each frame is (task id, index of the next dependency
    // to follow). The frame stack doubles as the current path.
    let mut visited: HashSet<i64> = HashSet::new();
    let mut on_stack: HashSet<i64> = HashSet::new();
    for start in order {
        if !visited.insert(start) {
            continue;
        }
        on_stack.insert(start);
        let mut frames: Vec<(i64, usize)> = vec![(start, 0)];

        while let Some(frame) = frames.last_mut() {
            let (current, next_index) = *frame;
            let deps: &[i64] = graph.get(&current).copied().unwrap_or(&[]);
            let Some(&next) = deps.get(next_index) else {
                on_stack.remove(&current);
                frames.pop();
                continue;
            };
            frame.1 += 1;

            if on_stack.contains(&next) {
                let mut cycle: Vec<i64> = frames.iter().map(|&(id, _)| id).collect();
                cycle.push(next);
                return Some(cycle);
            }
            if visited.insert(next) {
                on_stack.insert(next);
                frames.push((next, 0));
            }
        }
    }
    None
}

/// Scores a validated task list against one strategy.
pub struct ScoringEngine {
    weights: StrategyWeights,
    today: NaiveDate,
}

impl ScoringEngine {
    pub fn new(strategy: Strategy, today: NaiveDate) -> Self {
        Self {
            weights: StrategyWeights::for_strategy(strategy),
            today,
        }
    }

    pub fn weights(&self) -> StrategyWeights {
        self.weights
    }

    /// Score every task and sort by score, highest first. Ties keep
    /// submission order.
    pub fn score_tasks(&self, tasks: &[ValidatedTask]) -> Vec<ScoredTask> {
        let blocked = block_counts(tasks);

        let mut scored: Vec<ScoredTask> = tasks
            .iter()
            .map(|task| {
                let urgency = normalize_urgency(Some(task.due_date), self.today);
                let importance = normalize_importance(task.importance);
                let effort = normalize_effort(task.estimated_hours);
                let dependency = task
                    .id
                    .map(|id| normalize_dependencies(blocked.get(&id).copied().unwrap_or(0)))
                    .unwrap_or(0.0);

                let total = urgency * self.weights.urgency
                    + importance * self.weights.importance
                    + effort * self.weights.effort
                    + dependency * self.weights.dependencies;

                ScoredTask {
                    id: task.id,
                    title: task.title.clone(),
                    due_date: Some(task.due_date.format("%Y-%m-%d").to_string()),
                    estimated_hours: task.estimated_hours,
                    importance: task.importance,
                    dependencies: task.dependencies.clone(),
                    score: round_one_decimal(total),
                    breakdown: ScoreBreakdown {
                        urgency_score: urgency,
                        effort_score: effort,
                        importance_score: Some(importance),
                        dependency_score: Some(dependency),
                    },
                }
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored
    }
}

/// How many tasks wait on each task id.
fn block_counts(tasks: &[ValidatedTask]) -> HashMap<i64, usize> {
    let mut counts: HashMap<i64, usize> = tasks.iter().filter_map(|t| t.id).map(|id| (id, 0)).collect();
    for task in tasks {
        for dep in &task.dependencies {
            if let Some(count) = counts.get_mut(dep) {
                *count += 1;
            }
        }
    }
    counts
}

pub fn normalize_urgency(due_date: Option<NaiveDate>, today: NaiveDate) -> f64 {
    let Some(due_date) = due_date else {
        return 50.0;
    };
    let delta = (due_date - today).num_days();
    if delta < 0 {
        return 100.0;
    }
    (90.0 * (-(delta as f64) / 7.0).exp()).max(0.0)
}

pub fn normalize_importance(importance: i64) -> f64 {
    (importance * 10) as f64
}

pub fn normalize_effort(hours: f64) -> f64 {
    (100.0 - hours * 4.2).max(0.0)
}

pub fn normalize_dependencies(blocked: usize) -> f64 {
    if blocked == 0 {
        return 0.0;
    }
    (DEPENDENCY_MULTIPLIER * ((blocked + 1) as f64).log2()).min(100.0)
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
