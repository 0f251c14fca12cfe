//! Server configuration from environment.

use dispatch_core::PlannerConfig;
use dispatch_upstream::DEFAULT_ENDPOINT;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    /// Base URL of the upstream drone data service
    pub ilp_endpoint: String,
    pub planner: PlannerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8080,
            ilp_endpoint: DEFAULT_ENDPOINT.to_string(),
            planner: PlannerConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let mut planner = defaults.planner;
        planner.max_iterations = env::var("DISPATCH_MAX_ITERATIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(planner.max_iterations);
        planner.astar_max_expansions = env::var("DISPATCH_ASTAR_MAX_EXPANSIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(planner.astar_max_expansions);

        Self {
            server_port: env::var("DISPATCH_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.server_port),
            ilp_endpoint: env::var("ILP_ENDPOINT")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.ilp_endpoint),
            planner,
        }
    }
}
