//! # Taskrank Core Library
//!
//! Client core for a task prioritizer: users stage tasks (one at a time or
//! as a pasted JSON array), submit them to a scoring service, and view the
//! ordered results. The CLI and any other host are thin layers over this
//! crate.
//!
//! ## Architecture
//!
//! - **Event bus**: synchronous publish/subscribe that decouples state
//!   changes from view updates
//! - **Task store**: the single staging list; every mutation announces
//!   `state:updated`
//! - **Controllers**: intake (form and bulk paste), actions (analyze and
//!   suggest) and the UI state machine that picks the visible region
//! - **Scoring API**: HTTP client for the remote service plus an in-process
//!   scorer for offline use
//!
//! ## Key Components
//!
//! - [`EventBus`]: topic-based dispatch in registration order
//! - [`TaskStore`]: staged tasks in insertion order
//! - [`App`]: composition root wiring the controllers to a [`Surface`]
//! - [`ScoringApi`]: trait implemented by the scoring backends
//! - [`Config`]: application configuration management

pub mod action;
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod intake;
pub mod layout;
pub mod normalize;
pub mod render;
pub mod scoring;
pub mod store;
pub mod task;
pub mod ui;

pub use action::{ActionController, ActionKind, ActionOutcome};
pub use api::{HttpScoringClient, LocalScoringService, ScoringApi, SubmissionPayload};
pub use app::{scoring_api, App};
pub use config::Config;
pub use error::{
    ConfigError, CoreError, DeliveryError, HandlerError, TransportError, ValidationError,
};
pub use events::{BusEvent, EventBus, SubscriptionId, Topic};
pub use intake::{IntakeController, SingleTaskForm};
pub use layout::{ComponentLoader, FsTemplateSource, Slot, Tab, TemplateSource};
pub use render::{HtmlRenderer, Renderer};
pub use scoring::{ScoringEngine, StrategyWeights};
pub use store::{IdGenerator, TaskStore};
pub use task::{ResultMode, ScoreBreakdown, ScoredTask, Strategy, Task, TaskDraft, TaskId};
pub use ui::{HeadlessSurface, Region, Surface, UiState, UiStateController};
