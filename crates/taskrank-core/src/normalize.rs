//! Coercion rules that turn raw form fields and pasted JSON into task drafts.
//!
//! Coercion never fails. Anything that cannot be read as the expected type
//! is replaced by its default and nothing is reported to the user.

use serde_json::Value;

use crate::task::TaskDraft;

pub const DEFAULT_HOURS: f64 = 1.0;
pub const DEFAULT_IMPORTANCE: i64 = 5;
pub const UNTITLED: &str = "Untitled Task";

/// Hours from a form field. Empty, unparseable, non-finite and
/// non-positive inputs become [`DEFAULT_HOURS`].
pub fn coerce_hours(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .and_then(positive_hours)
        .unwrap_or(DEFAULT_HOURS)
}

fn positive_hours(hours: f64) -> Option<f64> {
    (hours.is_finite() && hours > 0.0).then_some(hours)
}

/// Importance from a form field. Decimal input is truncated; empty,
/// unparseable and zero inputs become [`DEFAULT_IMPORTANCE`]. Not clamped.
pub fn coerce_importance(raw: &str) -> i64 {
    let raw = raw.trim();
    raw.parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().and_then(truncate))
        .filter(|n| *n != 0)
        .unwrap_or(DEFAULT_IMPORTANCE)
}

fn truncate(value: f64) -> Option<i64> {
    (value.is_finite() && value.abs() < i64::MAX as f64).then(|| value.trunc() as i64)
}

/// Comma-separated dependency ids. Tokens that are not integers are dropped.
pub fn parse_dependencies(raw: &str) -> Vec<i64> {
    raw.split(',')
        .filter_map(|token| token.trim().parse::<i64>().ok())
        .collect()
}

/// A blank due date means "no due date".
pub fn blank_to_none(raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Normalize one element of a pasted JSON array.
///
/// Non-object elements have no readable fields and normalize to an
/// all-defaults draft.
pub fn normalize_bulk_entry(entry: &Value) -> TaskDraft {
    let field = |name: &str| entry.get(name).unwrap_or(&Value::Null);

    TaskDraft {
        title: title_from(field("title")),
        due_date: due_date_from(field("due_date")),
        estimated_hours: hours_from(field("estimated_hours")),
        importance: importance_from(field("importance")),
        dependencies: dependencies_from(field("dependencies")),
    }
}

fn title_from(value: &Value) -> String {
    match value {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Number(n) if n.as_f64() != Some(0.0) => n.to_string(),
        Value::Bool(true) => "true".to_string(),
        _ => UNTITLED.to_string(),
    }
}

fn due_date_from(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => blank_to_none(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn hours_from(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().and_then(positive_hours).unwrap_or(DEFAULT_HOURS),
        Value::String(s) => coerce_hours(s),
        _ => DEFAULT_HOURS,
    }
}

fn importance_from(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(truncate))
            .filter(|n| *n != 0)
            .unwrap_or(DEFAULT_IMPORTANCE),
        Value::String(s) => coerce_importance(s),
        _ => DEFAULT_IMPORTANCE,
    }
}

fn dependencies_from(value: &Value) -> Vec<i64> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn hours_fall_back_to_one() {
        assert_eq!(coerce_hours(""), 1.0);
        assert_eq!(coerce_hours("abc"), 1.0);
        assert_eq!(coerce_hours("0"), 1.0);
        assert_eq!(coerce_hours("-2"), 1.0);
        assert_eq!(coerce_hours(" 2.5 "), 2.5);
    }

    #[test]
    fn importance_falls_back_to_five() {
        assert_eq!(coerce_importance(""), 5);
        assert_eq!(coerce_importance("xyz"), 5);
        assert_eq!(coerce_importance("0"), 5);
        assert_eq!(coerce_importance("8"), 8);
        assert_eq!(coerce_importance("7.9"), 7);
        // Out-of-range values are kept; the service validates the range.
        assert_eq!(coerce_importance("42"), 42);
    }

    #[test]
    fn dependencies_drop_bad_tokens() {
        assert_eq!(parse_dependencies(""), Vec::<i64>::new());
        assert_eq!(parse_dependencies("1, 2,x, ,3"), vec![1, 2, 3]);
    }

    #[test]
    fn bulk_entry_applies_defaults() {
        let draft = normalize_bulk_entry(&json!({
            "estimated_hours": "abc",
            "importance": "xyz",
            "dependencies": "not an array"
        }));
        assert_eq!(draft.title, UNTITLED);
        assert_eq!(draft.due_date, None);
        assert_eq!(draft.estimated_hours, 1.0);
        assert_eq!(draft.importance, 5);
        assert!(draft.dependencies.is_empty());
    }

    #[test]
    fn bulk_entry_keeps_valid_fields() {
        let draft = normalize_bulk_entry(&json!({
            "title": "Fix login",
            "due_date": "2025-11-30",
            "estimated_hours": 3,
            "importance": 9,
            "dependencies": [1, "2", "x", 3.5]
        }));
        assert_eq!(draft.title, "Fix login");
        assert_eq!(draft.due_date.as_deref(), Some("2025-11-30"));
        assert_eq!(draft.estimated_hours, 3.0);
        assert_eq!(draft.importance, 9);
        assert_eq!(draft.dependencies, vec![1, 2]);
    }

    #[test]
    fn bulk_entry_treats_empty_strings_as_missing() {
        let draft = normalize_bulk_entry(&json!({ "title": "", "due_date": "" }));
        assert_eq!(draft.title, UNTITLED);
        assert_eq!(draft.due_date, None);
    }

    #[test]
    fn non_object_entry_is_all_defaults() {
        let draft = normalize_bulk_entry(&json!(17));
        assert_eq!(draft.title, UNTITLED);
        assert_eq!(draft.importance, DEFAULT_IMPORTANCE);
    }

    proptest! {
        #[test]
        fn coerced_hours_are_positive_and_finite(raw in ".*") {
            let hours = coerce_hours(&raw);
            prop_assert!(hours.is_finite() && hours > 0.0);
        }

        #[test]
        fn coerced_importance_is_never_zero(raw in ".*") {
            prop_assert_ne!(coerce_importance(&raw), 0);
        }

        #[test]
        fn integer_lists_survive_parsing(ids in proptest::collection::vec(any::<i64>(), 0..12)) {
            let raw = ids.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(", ");
            prop_assert_eq!(parse_dependencies(&raw), ids);
        }
    }
}
