//! View-visibility state machine.
//!
//! The controller listens on the bus and decides which of the three output
//! regions (results, loading, error) is visible. It never talks to the
//! scoring service; it only reacts to what the action controller publishes.
//!
//! ```text
//! Idle ──ui:loading──▶ Loading ──ui:success──▶ Success
//!                        │  ▲                     │
//!                 ui:error  └────ui:loading───────┤
//!                        ▼                        │
//!                      Error ──ui:loading─────────┘
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

use crate::error::HandlerError;
use crate::events::{BusEvent, EventBus, SubscriptionId, Topic};
use crate::layout::{Slot, Tab};
use crate::render::Renderer;
use crate::task::{ResultMode, ScoredTask};

/// Host seam standing in for the document. Implementations use interior
/// mutability; the bus calls into them from handlers.
pub trait Surface: Send + Sync {
    fn has_slot(&self, slot: Slot) -> bool;

    fn set_slot_html(&self, slot: Slot, html: &str);

    fn set_visible(&self, region: Region, visible: bool);

    /// Replace the staging list and its counter.
    fn set_staging(&self, html: &str, count: usize);

    /// Write into the dedicated error text element. Returns false when the
    /// error slot has no such element.
    fn set_error_text(&self, message: &str) -> bool;

    /// Show the form for `tab` and hide the other one.
    fn show_form(&self, tab: Tab);
}

/// Mutually exclusive output regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Results,
    Loading,
    Error,
}

impl Region {
    pub const ALL: [Region; 3] = [Region::Results, Region::Loading, Region::Error];

    pub fn slot(&self) -> Slot {
        match self {
            Region::Results => Slot::Results,
            Region::Loading => Slot::Loading,
            Region::Error => Slot::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum UiState {
    /// Before the first action; no region visible.
    #[default]
    Idle,
    Loading,
    Success(ResultMode),
    Error(String),
}

impl UiState {
    pub fn name(&self) -> &'static str {
        match self {
            UiState::Idle => "idle",
            UiState::Loading => "loading",
            UiState::Success(_) => "success",
            UiState::Error(_) => "error",
        }
    }

    /// Region shown in this state.
    pub fn region(&self) -> Option<Region> {
        match self {
            UiState::Idle => None,
            UiState::Loading => Some(Region::Loading),
            UiState::Success(_) => Some(Region::Results),
            UiState::Error(_) => Some(Region::Error),
        }
    }
}

impl fmt::Display for UiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("invalid ui transition from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}

pub struct UiTransition;

impl UiTransition {
    /// Any state may re-enter loading; only loading resolves to success or
    /// error.
    pub fn validate(from: &UiState, to: &UiState) -> Result<(), TransitionError> {
        let is_valid = match (from, to) {
            (_, UiState::Loading) => true,
            (UiState::Loading, UiState::Success(_)) => true,
            (UiState::Loading, UiState::Error(_)) => true,
            _ => false,
        };

        if is_valid {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition {
                from: from.name(),
                to: to.name(),
            })
        }
    }
}

struct Shared {
    state: Mutex<UiState>,
    surface: Arc<dyn Surface>,
    renderer: Arc<dyn Renderer>,
}

impl Shared {
    /// Move to `next` if allowed. Returns false when the transition was
    /// rejected and ignored. A missing `slot` fails the handler and leaves
    /// the state where it was.
    fn enter(&self, next: UiState, slot: Option<Slot>) -> Result<bool, HandlerError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = UiTransition::validate(&state, &next) {
            tracing::warn!(error = %err, "ignoring ui event");
            return Ok(false);
        }
        if let Some(slot) = slot {
            self.require_slot(slot)?;
        }
        tracing::debug!(from = %*state, to = %next, "ui transition");
        *state = next;
        Ok(true)
    }

    fn show_only(&self, region: Region) {
        for candidate in Region::ALL {
            self.surface.set_visible(candidate, candidate == region);
        }
    }

    fn require_slot(&self, slot: Slot) -> Result<(), HandlerError> {
        if self.surface.has_slot(slot) {
            Ok(())
        } else {
            Err(HandlerError::new(format!("slot '{slot}' is missing")))
        }
    }

    fn on_state_updated(&self, tasks: &[crate::task::Task]) -> Result<(), HandlerError> {
        self.require_slot(Slot::Staging)?;
        let html = self.renderer.staging(tasks);
        self.surface.set_staging(&html, tasks.len());
        Ok(())
    }

    fn on_loading(&self) -> Result<(), HandlerError> {
        if self.enter(UiState::Loading, None)? {
            self.show_only(Region::Loading);
        }
        Ok(())
    }

    fn on_success(&self, data: &[ScoredTask], is_suggest: bool) -> Result<(), HandlerError> {
        let mode = ResultMode::from_suggest_flag(is_suggest);
        if !self.enter(UiState::Success(mode), Some(Slot::Results))? {
            return Ok(());
        }
        let html = self.renderer.results(data, mode);
        self.surface.set_slot_html(Slot::Results, &html);
        self.show_only(Region::Results);
        Ok(())
    }

    fn on_error(&self, message: &str) -> Result<(), HandlerError> {
        // The text element lives inside the error slot.
        if !self.enter(UiState::Error(message.to_string()), Some(Slot::Error))? {
            return Ok(());
        }
        self.show_only(Region::Error);
        if !self.surface.set_error_text(message) {
            let html = self.renderer.error_panel(message);
            self.surface.set_slot_html(Slot::Error, &html);
        }
        Ok(())
    }
}

/// Subscribes to the four bus topics and drives the surface.
pub struct UiStateController {
    shared: Arc<Shared>,
    subscriptions: Vec<SubscriptionId>,
}

impl UiStateController {
    /// Subscribe to `bus`. Handlers stay registered until [`detach`](Self::detach).
    pub fn attach(bus: &EventBus, surface: Arc<dyn Surface>, renderer: Arc<dyn Renderer>) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(UiState::Idle),
            surface,
            renderer,
        });

        let subscriptions = Topic::ALL
            .iter()
            .map(|topic| {
                let shared = Arc::clone(&shared);
                bus.subscribe(*topic, move |event| match event {
                    BusEvent::StateUpdated(tasks) => shared.on_state_updated(tasks),
                    BusEvent::UiLoading => shared.on_loading(),
                    BusEvent::UiSuccess { data, is_suggest } => shared.on_success(data, *is_suggest),
                    BusEvent::UiError(message) => shared.on_error(message),
                })
            })
            .collect();

        Self {
            shared,
            subscriptions,
        }
    }

    pub fn state(&self) -> UiState {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn surface(&self) -> &Arc<dyn Surface> {
        &self.shared.surface
    }

    /// Drop every subscription made by [`attach`](Self::attach).
    pub fn detach(&mut self, bus: &EventBus) {
        for id in self.subscriptions.drain(..) {
            bus.unsubscribe(id);
        }
    }
}

impl fmt::Debug for UiStateController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiStateController")
            .field("state", &self.state())
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

#[derive(Debug, Default)]
struct HeadlessState {
    slots: HashMap<Slot, String>,
    visible: HashSet<Region>,
    staging_html: String,
    staging_count: usize,
    error_text: Option<String>,
    active_form: Tab,
}

/// In-memory surface for tests and non-visual hosts.
#[derive(Debug)]
pub struct HeadlessSurface {
    present: HashSet<Slot>,
    error_text_element: bool,
    state: Mutex<HeadlessState>,
}

impl HeadlessSurface {
    pub fn with_all_slots() -> Self {
        Self::with_slots(&Slot::ALL)
    }

    pub fn with_slots(slots: &[Slot]) -> Self {
        Self {
            present: slots.iter().copied().collect(),
            error_text_element: true,
            state: Mutex::new(HeadlessState::default()),
        }
    }

    /// Model an error slot whose template has no text element.
    pub fn without_error_text(mut self) -> Self {
        self.error_text_element = false;
        self
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut HeadlessState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    pub fn slot_html(&self, slot: Slot) -> Option<String> {
        self.with_state(|s| s.slots.get(&slot).cloned())
    }

    pub fn is_visible(&self, region: Region) -> bool {
        self.with_state(|s| s.visible.contains(&region))
    }

    pub fn visible_regions(&self) -> Vec<Region> {
        self.with_state(|s| {
            Region::ALL
                .into_iter()
                .filter(|r| s.visible.contains(r))
                .collect()
        })
    }

    pub fn staging_html(&self) -> String {
        self.with_state(|s| s.staging_html.clone())
    }

    pub fn staging_count(&self) -> usize {
        self.with_state(|s| s.staging_count)
    }

    pub fn error_text(&self) -> Option<String> {
        self.with_state(|s| s.error_text.clone())
    }

    pub fn active_form(&self) -> Tab {
        self.with_state(|s| s.active_form)
    }
}

impl Surface for HeadlessSurface {
    fn has_slot(&self, slot: Slot) -> bool {
        self.present.contains(&slot)
    }

    fn set_slot_html(&self, slot: Slot, html: &str) {
        if self.has_slot(slot) {
            self.with_state(|s| {
                s.slots.insert(slot, html.to_string());
            });
        }
    }

    fn set_visible(&self, region: Region, visible: bool) {
        self.with_state(|s| {
            if visible {
                s.visible.insert(region);
            } else {
                s.visible.remove(&region);
            }
        });
    }

    fn set_staging(&self, html: &str, count: usize) {
        self.with_state(|s| {
            s.staging_html = html.to_string();
            s.staging_count = count;
        });
    }

    fn set_error_text(&self, message: &str) -> bool {
        if !self.error_text_element || !self.has_slot(Slot::Error) {
            return false;
        }
        self.with_state(|s| s.error_text = Some(message.to_string()));
        true
    }

    fn show_form(&self, tab: Tab) {
        self.with_state(|s| s.active_form = tab);
    }
}
