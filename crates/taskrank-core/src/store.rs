//! Authoritative staging list.
//!
//! The store is the only owner of staged tasks. Every mutation publishes
//! exactly one `state:updated` carrying the full list in insertion order;
//! the event is published after the internal lock is released so handlers
//! can read the store again.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::events::{BusEvent, EventBus};
use crate::task::{Task, TaskDraft, TaskId};

/// Monotonic id source. Seeded from the wall clock so ids look like the
/// creation timestamp, then incremented so two tasks created in the same
/// millisecond never share an id.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    pub fn from_clock() -> Self {
        let millis = chrono::Utc::now().timestamp_millis().max(1) as u64;
        Self::starting_at(millis)
    }

    pub fn next_id(&mut self) -> TaskId {
        let id = TaskId(self.next);
        self.next += 1;
        id
    }
}

#[derive(Debug)]
struct Inner {
    tasks: Vec<Task>,
    ids: IdGenerator,
}

/// Shared handle to the staging list. Clones refer to the same list.
#[derive(Debug, Clone)]
pub struct TaskStore {
    inner: Arc<Mutex<Inner>>,
    bus: EventBus,
}

impl TaskStore {
    pub fn new(bus: EventBus) -> Self {
        Self::with_ids(bus, IdGenerator::from_clock())
    }

    pub fn with_ids(bus: EventBus, ids: IdGenerator) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                tasks: Vec::new(),
                ids,
            })),
            bus,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one task and announce the new list.
    pub fn push(&self, draft: TaskDraft) -> TaskId {
        let (id, snapshot) = {
            let mut inner = self.lock();
            let id = inner.ids.next_id();
            inner.tasks.push(draft.into_task(id));
            (id, inner.tasks.clone())
        };
        tracing::debug!(task_id = %id, staged = snapshot.len(), "task staged");
        self.announce(snapshot);
        id
    }

    /// Append a batch in order and announce once. An empty batch still
    /// announces the (unchanged) list.
    pub fn extend(&self, drafts: Vec<TaskDraft>) -> Vec<TaskId> {
        let (ids, snapshot) = {
            let mut inner = self.lock();
            let mut ids = Vec::with_capacity(drafts.len());
            for draft in drafts {
                let id = inner.ids.next_id();
                inner.tasks.push(draft.into_task(id));
                ids.push(id);
            }
            (ids, inner.tasks.clone())
        };
        tracing::debug!(added = ids.len(), staged = snapshot.len(), "batch staged");
        self.announce(snapshot);
        ids
    }

    /// Drop every task with `id` and announce the list. Unknown ids are not
    /// an error; the unchanged list is announced. Returns how many tasks
    /// were removed.
    pub fn remove(&self, id: TaskId) -> usize {
        let (removed, snapshot) = {
            let mut inner = self.lock();
            let before = inner.tasks.len();
            inner.tasks.retain(|task| task.id != id);
            (before - inner.tasks.len(), inner.tasks.clone())
        };
        tracing::debug!(task_id = %id, removed, "task removal");
        self.announce(snapshot);
        removed
    }

    pub fn snapshot(&self) -> Vec<Task> {
        self.lock().tasks.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().tasks.is_empty()
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.lock().tasks.iter().any(|task| task.id == id)
    }

    fn announce(&self, snapshot: Vec<Task>) {
        if let Err(err) = self.bus.publish(BusEvent::StateUpdated(snapshot)) {
            tracing::warn!(error = %err, "state:updated delivery aborted");
        }
    }
}
