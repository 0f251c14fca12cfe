//! Shared application state.

use dispatch_core::{DeliveryPlanner, FleetSource, PlannerConfig, RestrictedAreaIndex, RestrictedAreaSource};
use std::sync::Arc;

pub struct AppState {
    fleet: Arc<dyn FleetSource>,
    areas: Arc<RestrictedAreaIndex>,
    planner_config: PlannerConfig,
}

impl AppState {
    pub fn new(
        fleet: Arc<dyn FleetSource>,
        areas: Arc<dyn RestrictedAreaSource>,
        planner_config: PlannerConfig,
    ) -> Self {
        Self {
            fleet,
            areas: Arc::new(RestrictedAreaIndex::new(areas)),
            planner_config,
        }
    }

    pub fn fleet(&self) -> &dyn FleetSource {
        self.fleet.as_ref()
    }

    pub fn areas(&self) -> &RestrictedAreaIndex {
        &self.areas
    }

    pub fn planner(&self) -> DeliveryPlanner<'_> {
        DeliveryPlanner::new(self.fleet.as_ref(), &self.areas)
            .with_config(self.planner_config.clone())
    }
}
