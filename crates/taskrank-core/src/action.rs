//! Action controller: submits staged tasks for analysis or suggestions.
//!
//! A run assembles its payload synchronously, publishes `ui:loading`,
//! awaits the scoring API and then publishes `ui:success` or `ui:error`.
//! Each run takes a new request generation; when a newer run has started
//! by the time a response arrives, the response is dropped without
//! publishing anything.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::api::{ScoringApi, SubmissionPayload};
use crate::error::ValidationError;
use crate::events::{BusEvent, EventBus};
use crate::intake::parse_bulk_array;
use crate::store::TaskStore;
use crate::task::{ResultMode, Strategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Analyze(Strategy),
    Suggest,
}

impl ActionKind {
    pub fn mode(&self) -> ResultMode {
        match self {
            ActionKind::Analyze(_) => ResultMode::Analysis,
            ActionKind::Suggest => ResultMode::Suggestion,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Analyze(strategy) => write!(f, "analyze({strategy})"),
            ActionKind::Suggest => f.write_str("suggest"),
        }
    }
}

/// What happened to a run that got past payload assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// `ui:success` was published with `count` results.
    Completed { count: usize },
    /// `ui:error` was published with `message`.
    Failed { message: String },
    /// A newer run started first; nothing was published for this one.
    Superseded,
}

#[derive(Clone)]
pub struct ActionController {
    store: TaskStore,
    bus: EventBus,
    api: Arc<dyn ScoringApi>,
    generation: Arc<AtomicU64>,
}

impl ActionController {
    pub fn new(store: TaskStore, bus: EventBus, api: Arc<dyn ScoringApi>) -> Self {
        Self {
            store,
            bus,
            api,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Snapshot of the staged tasks followed by the bulk textarea entries.
    ///
    /// # Errors
    ///
    /// Fails when the textarea holds something other than a JSON array, or
    /// when there is nothing to submit.
    pub fn assemble(&self, bulk_text: &str) -> Result<SubmissionPayload, ValidationError> {
        let bulk = if bulk_text.trim().is_empty() {
            Vec::new()
        } else {
            parse_bulk_array(bulk_text.trim())?
        };

        let payload = SubmissionPayload::assemble(&self.store.snapshot(), bulk)
            .map_err(|e| ValidationError::malformed(&e))?;
        if payload.is_empty() {
            return Err(ValidationError::NothingToSubmit);
        }
        Ok(payload)
    }

    /// Submit the current tasks.
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] from [`assemble`](Self::assemble);
    /// in that case no event is published and the API is not called.
    /// Transport failures are not errors here: they are published as
    /// `ui:error` and reported as [`ActionOutcome::Failed`].
    pub async fn run(
        &self,
        kind: ActionKind,
        bulk_text: &str,
    ) -> Result<ActionOutcome, ValidationError> {
        let payload = self.assemble(bulk_text)?;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        tracing::info!(
            action = %kind,
            tasks = payload.len(),
            api = self.api.name(),
            generation,
            "submitting tasks"
        );
        self.publish(BusEvent::UiLoading);

        let result = match kind {
            ActionKind::Analyze(strategy) => self.api.analyze(&payload, strategy).await,
            ActionKind::Suggest => self.api.suggest(&payload).await,
        };

        let current = self.generation.load(Ordering::SeqCst);
        if current != generation {
            tracing::debug!(generation, current, "discarding stale response");
            return Ok(ActionOutcome::Superseded);
        }

        match result {
            Ok(data) => {
                let count = data.len();
                tracing::info!(action = %kind, count, "scoring finished");
                self.publish(BusEvent::success(data, kind.mode()));
                Ok(ActionOutcome::Completed { count })
            }
            Err(err) => {
                let message = err.to_string();
                tracing::info!(action = %kind, error = %message, "scoring failed");
                self.publish(BusEvent::UiError(message.clone()));
                Ok(ActionOutcome::Failed { message })
            }
        }
    }

    pub fn api_name(&self) -> &str {
        self.api.name()
    }

    /// Generation of the most recent run.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn publish(&self, event: BusEvent) {
        if let Err(err) = self.bus.publish(event) {
            tracing::warn!(error = %err, "event delivery failed");
        }
    }
}

impl fmt::Debug for ActionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionController")
            .field("api", &self.api.name())
            .field("generation", &self.generation())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::events::Topic;
    use crate::store::IdGenerator;
    use crate::task::{ScoreBreakdown, ScoredTask, TaskDraft};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use tokio::sync::{oneshot, Notify};

    fn scored(title: &str) -> ScoredTask {
        ScoredTask {
            id: None,
            title: title.into(),
            due_date: None,
            estimated_hours: 1.0,
            importance: 5,
            dependencies: vec![],
            score: 50.0,
            breakdown: ScoreBreakdown {
                urgency_score: 50.0,
                effort_score: 95.8,
                importance_score: None,
                dependency_score: None,
            },
        }
    }

    #[derive(Default)]
    struct StubApi {
        calls: Mutex<Vec<(String, SubmissionPayload)>>,
        fail_with: Option<TransportError>,
        hold_analyze: Mutex<Option<oneshot::Receiver<()>>>,
        started: Notify,
    }

    impl StubApi {
        fn calls(&self) -> Vec<(String, SubmissionPayload)> {
            self.calls.lock().unwrap().clone()
        }

        fn answer(&self) -> Result<Vec<ScoredTask>, TransportError> {
            match &self.fail_with {
                Some(err) => Err(err.clone()),
                None => Ok(vec![scored("a")]),
            }
        }
    }

    #[async_trait]
    impl ScoringApi for StubApi {
        fn name(&self) -> &str {
            "stub"
        }

        async fn analyze(
            &self,
            payload: &SubmissionPayload,
            strategy: Strategy,
        ) -> Result<Vec<ScoredTask>, TransportError> {
            self.calls
                .lock()
                .unwrap()
                .push((format!("analyze:{strategy}"), payload.clone()));
            let hold = self.hold_analyze.lock().unwrap().take();
            self.started.notify_one();
            if let Some(rx) = hold {
                let _ = rx.await;
            }
            self.answer()
        }

        async fn suggest(
            &self,
            payload: &SubmissionPayload,
        ) -> Result<Vec<ScoredTask>, TransportError> {
            self.calls
                .lock()
                .unwrap()
                .push(("suggest".into(), payload.clone()));
            self.answer()
        }
    }

    fn record(bus: &EventBus) -> Arc<Mutex<Vec<BusEvent>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        for topic in [Topic::UiLoading, Topic::UiSuccess, Topic::UiError] {
            let seen = Arc::clone(&seen);
            bus.subscribe(topic, move |event| {
                seen.lock().unwrap().push(event.clone());
                Ok(())
            });
        }
        seen
    }

    fn setup(api: StubApi) -> (ActionController, TaskStore, Arc<StubApi>, Arc<Mutex<Vec<BusEvent>>>) {
        let bus = EventBus::new();
        let store = TaskStore::with_ids(bus.clone(), IdGenerator::starting_at(100));
        let api = Arc::new(api);
        let controller = ActionController::new(
            store.clone(),
            bus.clone(),
            Arc::clone(&api) as Arc<dyn ScoringApi>,
        );
        let seen = record(&bus);
        (controller, store, api, seen)
    }

    fn draft(title: &str) -> TaskDraft {
        TaskDraft {
            title: title.into(),
            due_date: None,
            estimated_hours: 2.0,
            importance: 8,
            dependencies: vec![],
        }
    }

    #[test]
    fn assemble_puts_staged_tasks_before_bulk_entries() {
        let (controller, store, _api, _seen) = setup(StubApi::default());
        store.push(draft("staged"));

        let payload = controller
            .assemble(r#"[{"title": "pasted", "importance": "9"}]"#)
            .unwrap();

        assert_eq!(payload.len(), 2);
        assert_eq!(payload.items()[0]["title"], "staged");
        assert_eq!(payload.items()[0]["id"], 100);
        assert!(payload.items()[0].get("due_date").is_none());
        assert_eq!(payload.items()[1], json!({"title": "pasted", "importance": "9"}));
    }

    #[test]
    fn assemble_rejects_bad_bulk_text() {
        let (controller, store, _api, _seen) = setup(StubApi::default());
        store.push(draft("staged"));

        assert!(matches!(
            controller.assemble("[{"),
            Err(ValidationError::MalformedJson(_))
        ));
        assert_eq!(
            controller.assemble(r#"{"title": "x"}"#),
            Err(ValidationError::NotAnArray)
        );
    }

    #[test]
    fn assemble_requires_something_to_submit() {
        let (controller, _store, _api, _seen) = setup(StubApi::default());
        assert_eq!(controller.assemble("  "), Err(ValidationError::NothingToSubmit));
        assert_eq!(controller.assemble("[]"), Err(ValidationError::NothingToSubmit));
    }

    #[tokio::test]
    async fn empty_submission_never_reaches_the_api() {
        let (controller, _store, api, seen) = setup(StubApi::default());

        let err = controller.run(ActionKind::Suggest, "").await.unwrap_err();

        assert_eq!(err, ValidationError::NothingToSubmit);
        assert!(api.calls().is_empty());
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(controller.generation(), 0);
    }

    #[tokio::test]
    async fn analyze_publishes_loading_then_success() {
        let (controller, store, api, seen) = setup(StubApi::default());
        store.push(draft("Write report"));

        let outcome = controller
            .run(ActionKind::Analyze(Strategy::Deadline), "")
            .await
            .unwrap();

        assert_eq!(outcome, ActionOutcome::Completed { count: 1 });
        assert_eq!(api.calls()[0].0, "analyze:deadline");
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], BusEvent::UiLoading);
        assert!(matches!(
            &seen[1],
            BusEvent::UiSuccess { is_suggest: false, data } if data.len() == 1
        ));
    }

    #[tokio::test]
    async fn transport_failure_becomes_ui_error() {
        let (controller, store, _api, seen) = setup(StubApi {
            fail_with: Some(TransportError::Rejected {
                status: 500,
                message: "boom".into(),
            }),
            ..StubApi::default()
        });
        store.push(draft("x"));

        let outcome = controller.run(ActionKind::Suggest, "").await.unwrap();

        assert_eq!(
            outcome,
            ActionOutcome::Failed {
                message: "boom".into()
            }
        );
        assert_eq!(
            *seen.lock().unwrap(),
            vec![BusEvent::UiLoading, BusEvent::UiError("boom".into())]
        );
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn stale_response_is_discarded() {
        let (tx, rx) = oneshot::channel();
        let (controller, store, api, seen) = setup(StubApi {
            hold_analyze: Mutex::new(Some(rx)),
            ..StubApi::default()
        });
        store.push(draft("x"));

        let first = tokio::spawn({
            let controller = controller.clone();
            async move { controller.run(ActionKind::Analyze(Strategy::Default), "").await }
        });
        api.started.notified().await;

        let second = controller.run(ActionKind::Suggest, "").await.unwrap();
        tx.send(()).unwrap();
        let first = first.await.unwrap().unwrap();

        assert_eq!(second, ActionOutcome::Completed { count: 1 });
        assert_eq!(first, ActionOutcome::Superseded);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0], BusEvent::UiLoading);
        assert_eq!(seen[1], BusEvent::UiLoading);
        assert!(matches!(&seen[2], BusEvent::UiSuccess { is_suggest: true, .. }));
    }

    #[tokio::test]
    async fn payload_is_snapshotted_before_the_call() {
        let (tx, rx) = oneshot::channel();
        let (controller, store, api, _seen) = setup(StubApi {
            hold_analyze: Mutex::new(Some(rx)),
            ..StubApi::default()
        });
        store.push(draft("before"));

        let run = tokio::spawn({
            let controller = controller.clone();
            async move { controller.run(ActionKind::Analyze(Strategy::Default), "").await }
        });
        api.started.notified().await;
        store.push(draft("after"));
        tx.send(()).unwrap();
        run.await.unwrap().unwrap();

        assert_eq!(api.calls()[0].1.len(), 1);
        assert_eq!(store.len(), 2);
    }
}
