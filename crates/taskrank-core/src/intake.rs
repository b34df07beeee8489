//! Intake controller: the single-entry form, bulk JSON import and removal.

use serde_json::Value;

use crate::error::ValidationError;
use crate::normalize::{
    blank_to_none, coerce_hours, coerce_importance, normalize_bulk_entry, parse_dependencies,
};
use crate::store::TaskStore;
use crate::task::{TaskDraft, TaskId};

/// Attribute carried by each staging-row remove button.
pub const TASK_ID_ATTR: &str = "data-task-id";

/// Displayed value of the importance field after a reset.
pub const IMPORTANCE_FIELD_DEFAULT: &str = "5";

/// Raw values of the single-entry form, exactly as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleTaskForm {
    pub title: String,
    pub due_date: String,
    pub estimated_hours: String,
    pub importance: String,
    /// Comma-separated ids
    pub dependencies: String,
}

impl Default for SingleTaskForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            due_date: String::new(),
            estimated_hours: String::new(),
            importance: IMPORTANCE_FIELD_DEFAULT.to_string(),
            dependencies: String::new(),
        }
    }
}

impl SingleTaskForm {
    pub fn draft(&self) -> TaskDraft {
        TaskDraft {
            title: self.title.clone(),
            due_date: blank_to_none(&self.due_date),
            estimated_hours: coerce_hours(&self.estimated_hours),
            importance: coerce_importance(&self.importance),
            dependencies: parse_dependencies(&self.dependencies),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Parse pasted text as a JSON array without touching any state.
pub(crate) fn parse_bulk_array(text: &str) -> Result<Vec<Value>, ValidationError> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(_) => Err(ValidationError::NotAnArray),
        Err(err) => Err(ValidationError::malformed(&err)),
    }
}

#[derive(Debug, Clone)]
pub struct IntakeController {
    store: TaskStore,
}

impl IntakeController {
    pub fn new(store: TaskStore) -> Self {
        Self { store }
    }

    /// Stage the form's task and reset the form.
    pub fn add_single(&self, form: &mut SingleTaskForm) -> TaskId {
        let id = self.store.push(form.draft());
        form.reset();
        id
    }

    /// Import every element of the pasted JSON array, in order, and clear
    /// the textarea.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the textarea is blank, is not
    /// JSON, or is not an array. Nothing is staged and the textarea is
    /// left as it was.
    pub fn load_bulk(&self, textarea: &mut String) -> Result<usize, ValidationError> {
        let raw = textarea.trim();
        if raw.is_empty() {
            return Err(ValidationError::EmptyBulkInput);
        }

        let entries = parse_bulk_array(raw)?;
        let drafts: Vec<TaskDraft> = entries.iter().map(normalize_bulk_entry).collect();
        let count = drafts.len();
        self.store.extend(drafts);
        textarea.clear();

        tracing::info!(count, "bulk import staged");
        Ok(count)
    }

    pub fn remove(&self, id: TaskId) -> usize {
        self.store.remove(id)
    }

    /// Delegated click handler for the staging list. `attr` is the value of
    /// [`TASK_ID_ATTR`] on the clicked element, if it has one. Returns true
    /// when the click resolved to a removal.
    pub fn handle_staging_click(&self, attr: Option<&str>) -> bool {
        let Some(raw) = attr else {
            return false;
        };
        match raw.parse::<TaskId>() {
            Ok(id) => {
                self.store.remove(id);
                true
            }
            Err(_) => {
                tracing::debug!(value = raw, "ignoring click with unreadable task id");
                false
            }
        }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }
}
