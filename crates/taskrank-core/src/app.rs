//! Composition root: one bus, one store and the three controllers.

use std::sync::Arc;

use crate::action::ActionController;
use crate::api::{HttpScoringClient, LocalScoringService, ScoringApi};
use crate::config::Config;
use crate::error::ConfigError;
use crate::events::EventBus;
use crate::intake::IntakeController;
use crate::layout::{Slot, Tab};
use crate::render::Renderer;
use crate::store::TaskStore;
use crate::task::Strategy;
use crate::ui::{Surface, UiStateController};

/// Scoring backend selected by `api.offline`.
///
/// # Errors
///
/// Returns an error if the configured base URL is not usable.
pub fn scoring_api(config: &Config) -> Result<Arc<dyn ScoringApi>, ConfigError> {
    if config.api.offline {
        Ok(Arc::new(LocalScoringService::new()))
    } else {
        Ok(Arc::new(HttpScoringClient::from_config(&config.api)?))
    }
}

#[derive(Debug)]
pub struct App {
    bus: EventBus,
    store: TaskStore,
    intake: IntakeController,
    actions: ActionController,
    ui: UiStateController,
    strategy: Strategy,
    tab: Tab,
}

impl App {
    /// Wire the controllers to `surface`. Missing slots are logged, not
    /// fatal; a handler that later needs one fails its delivery instead.
    pub fn initialize(
        config: &Config,
        surface: Arc<dyn Surface>,
        renderer: Arc<dyn Renderer>,
        api: Arc<dyn ScoringApi>,
    ) -> Self {
        let missing: Vec<Slot> = Slot::ALL
            .into_iter()
            .filter(|slot| !surface.has_slot(*slot))
            .collect();
        for slot in &missing {
            tracing::warn!(slot = %slot, "slot missing at initialization");
        }

        let bus = EventBus::new();
        let store = TaskStore::new(bus.clone());
        let ui = UiStateController::attach(&bus, surface, renderer);
        let intake = IntakeController::new(store.clone());
        let actions = ActionController::new(store.clone(), bus.clone(), api);

        let tab = Tab::default();
        ui.surface().show_form(tab);

        tracing::info!(
            api = actions.api_name(),
            strategy = %config.ui.default_strategy,
            missing_slots = missing.len(),
            "app initialized"
        );

        Self {
            bus,
            store,
            intake,
            actions,
            ui,
            strategy: config.ui.default_strategy,
            tab,
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn intake(&self) -> &IntakeController {
        &self.intake
    }

    pub fn actions(&self) -> &ActionController {
        &self.actions
    }

    pub fn ui(&self) -> &UiStateController {
        &self.ui
    }

    /// Strategy currently selected in the strategy selector.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn set_strategy(&mut self, strategy: Strategy) {
        tracing::debug!(%strategy, "strategy selected");
        self.strategy = strategy;
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    /// Switch the intake tab, showing its form and hiding the other.
    pub fn select_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.ui.surface().show_form(tab);
    }
}
