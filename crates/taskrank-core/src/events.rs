//! Publish/subscribe bus that decouples state mutation from view updates.
//!
//! Delivery is synchronous: [`EventBus::publish`] returns only after every
//! handler registered for the event's topic has run, in registration order.
//! There is no queueing and no deduplication.
//!
//! A handler that returns an error stops delivery for that publish; the
//! handlers registered after it do not run and the caller gets a
//! [`DeliveryError`] naming the failing position. Publishers decide what to
//! do with it (the controllers log and carry on).

use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{DeliveryError, HandlerError};
use crate::task::{ResultMode, ScoredTask, Task};

/// Topics recognized by the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    StateUpdated,
    UiLoading,
    UiSuccess,
    UiError,
}

impl Topic {
    pub const ALL: [Topic; 4] = [
        Topic::StateUpdated,
        Topic::UiLoading,
        Topic::UiSuccess,
        Topic::UiError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::StateUpdated => "state:updated",
            Topic::UiLoading => "ui:loading",
            Topic::UiSuccess => "ui:success",
            Topic::UiError => "ui:error",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event and its payload. Serializes as `{"topic": ..., "payload": ...}`
/// so a webview host can forward it unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "topic", content = "payload")]
pub enum BusEvent {
    /// Full ordered staging list after a store mutation.
    #[serde(rename = "state:updated")]
    StateUpdated(Vec<Task>),
    /// A scoring request is about to start.
    #[serde(rename = "ui:loading")]
    UiLoading,
    /// A scoring request succeeded.
    #[serde(rename = "ui:success")]
    UiSuccess {
        data: Vec<ScoredTask>,
        #[serde(rename = "isSuggest")]
        is_suggest: bool,
    },
    /// A scoring request failed; carries the user-facing message.
    #[serde(rename = "ui:error")]
    UiError(String),
}

impl BusEvent {
    pub fn topic(&self) -> Topic {
        match self {
            BusEvent::StateUpdated(_) => Topic::StateUpdated,
            BusEvent::UiLoading => Topic::UiLoading,
            BusEvent::UiSuccess { .. } => Topic::UiSuccess,
            BusEvent::UiError(_) => Topic::UiError,
        }
    }

    pub fn success(data: Vec<ScoredTask>, mode: ResultMode) -> Self {
        BusEvent::UiSuccess {
            data,
            is_suggest: mode.is_suggest(),
        }
    }
}

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&BusEvent) -> Result<(), HandlerError> + Send + Sync>;

struct Registration {
    id: SubscriptionId,
    topic: Topic,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    registrations: Vec<Registration>,
}

/// Explicit bus instance; clones share the same registry.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `topic`. Handlers for a topic run in the order
    /// they were registered.
    pub fn subscribe<F>(&self, topic: Topic, handler: F) -> SubscriptionId
    where
        F: Fn(&BusEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        registry.next_id += 1;
        let id = SubscriptionId(registry.next_id);
        registry.registrations.push(Registration {
            id,
            topic,
            handler: Arc::new(handler),
        });
        tracing::debug!(topic = %topic, subscription = id.0, "bus subscribe");
        id
    }

    /// Remove a subscription. Returns false if it was already gone.
    /// Remaining handlers keep their relative order.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        let before = registry.registrations.len();
        registry.registrations.retain(|r| r.id != id);
        registry.registrations.len() != before
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        let registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        registry
            .registrations
            .iter()
            .filter(|r| r.topic == topic)
            .count()
    }

    /// Deliver `event` to every handler of its topic.
    ///
    /// The handler list is captured before delivery starts, so handlers may
    /// publish or subscribe themselves; a subscription made during delivery
    /// only sees later publishes.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] for the first handler that fails; handlers
    /// after it are skipped for this publish.
    pub fn publish(&self, event: BusEvent) -> Result<(), DeliveryError> {
        let topic = event.topic();
        let handlers: Vec<Handler> = {
            let registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
            registry
                .registrations
                .iter()
                .filter(|r| r.topic == topic)
                .map(|r| Arc::clone(&r.handler))
                .collect()
        };

        tracing::debug!(topic = %topic, handlers = handlers.len(), "bus publish");

        let total = handlers.len();
        for (position, handler) in handlers.iter().enumerate() {
            if let Err(source) = handler(&event) {
                return Err(DeliveryError {
                    topic: topic.as_str(),
                    position,
                    skipped: total - position - 1,
                    source,
                });
            }
        }
        Ok(())
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("EventBus")
            .field("subscriptions", &registry.registrations.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(bus: &EventBus, topic: Topic, tag: &'static str, log: &Arc<Mutex<Vec<String>>>) {
        let log = Arc::clone(log);
        bus.subscribe(topic, move |event| {
            log.lock().unwrap().push(format!("{tag}:{}", event.topic()));
            Ok(())
        });
    }

    #[test]
    fn delivers_in_registration_order() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        recorder(&bus, Topic::UiLoading, "a", &log);
        recorder(&bus, Topic::UiLoading, "b", &log);
        recorder(&bus, Topic::UiError, "c", &log);

        bus.publish(BusEvent::UiLoading).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["a:ui:loading".to_string(), "b:ui:loading".to_string()]
        );
    }

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let bus = EventBus::new();
        assert!(bus.publish(BusEvent::UiError("x".into())).is_ok());
    }

    #[test]
    fn failing_handler_stops_later_handlers() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        recorder(&bus, Topic::UiLoading, "first", &log);
        bus.subscribe(Topic::UiLoading, |_| Err(HandlerError::new("broken view")));
        recorder(&bus, Topic::UiLoading, "third", &log);

        let err = bus.publish(BusEvent::UiLoading).unwrap_err();

        assert_eq!(err.position, 1);
        assert_eq!(err.skipped, 1);
        assert_eq!(err.topic, "ui:loading");
        assert_eq!(*log.lock().unwrap(), vec!["first:ui:loading".to_string()]);
    }

    #[test]
    fn unsubscribe_keeps_remaining_order() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        recorder(&bus, Topic::UiLoading, "a", &log);
        let log_b = Arc::clone(&log);
        let b = bus.subscribe(Topic::UiLoading, move |_| {
            log_b.lock().unwrap().push("b".into());
            Ok(())
        });
        recorder(&bus, Topic::UiLoading, "c", &log);

        assert!(bus.unsubscribe(b));
        assert!(!bus.unsubscribe(b));
        bus.publish(BusEvent::UiLoading).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["a:ui:loading".to_string(), "c:ui:loading".to_string()]
        );
        assert_eq!(bus.subscriber_count(Topic::UiLoading), 2);
    }

    #[test]
    fn handlers_may_publish_reentrantly() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let inner = bus.clone();
        bus.subscribe(Topic::UiLoading, move |_| {
            inner
                .publish(BusEvent::UiError("nested".into()))
                .map_err(|e| HandlerError::new(e.to_string()))
        });
        recorder(&bus, Topic::UiError, "err", &log);

        bus.publish(BusEvent::UiLoading).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["err:ui:error".to_string()]);
    }

    #[test]
    fn success_event_serializes_with_wire_names() {
        let event = BusEvent::success(vec![], ResultMode::Suggestion);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["topic"], "ui:success");
        assert_eq!(json["payload"]["isSuggest"], true);
    }
}
