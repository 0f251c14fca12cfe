//! Step-based path search around restricted areas.
//!
//! Two strategies share the same discretised move graph: every move is one
//! [`STEP`](crate::spatial::STEP) long along one of the 16 compass headings.
//!
//! - [`GreedyPathFinder`]: heads for the destination, deflecting around
//!   blocked steps, with a relaxed second pass when the first one fails.
//! - [`AStarPathFinder`]: best-first search with a straight-line heuristic.

mod astar;
mod greedy;

pub use astar::AStarPathFinder;
pub use greedy::{GreedyPathFinder, SearchMode};

use crate::models::Position;
use crate::spatial::STEP;
use serde::{Deserialize, Serialize};

/// A strategy producing a restricted-area-free waypoint sequence.
pub trait PathFinder {
    /// Waypoints from `start` to exactly `end`, or `None` when no path was found.
    fn find(&self, start: Position, end: Position) -> Option<Vec<Position>>;
}

/// Tuning knobs shared by both path search strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Length of a single move (degrees)
    pub step: f64,
    /// Greedy iteration cap per search pass
    pub max_iterations: u32,
    /// A* node expansion cap
    pub astar_max_expansions: usize,
    /// Accept a deflected step if it leaves us at most this factor further away
    pub progress_tolerance: f64,
    /// Relaxed pass tolerance once the search has been stuck for a while
    pub stuck_tolerance: f64,
    /// Non-improving steps before the relaxed pass loosens its tolerance
    pub stuck_relax_after: u32,
    /// Non-improving steps before the relaxed pass gives up
    pub stuck_abandon_after: u32,
    /// Heading offsets tried on each side in the primary pass
    pub primary_offsets: u32,
    /// Heading offsets tried on each side in the relaxed pass
    pub relaxed_offsets: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            step: STEP,
            max_iterations: 20_000,
            astar_max_expansions: 60_000,
            progress_tolerance: 1.5,
            stuck_tolerance: 2.0,
            stuck_relax_after: 20,
            stuck_abandon_after: 50,
            primary_offsets: 4,
            relaxed_offsets: 6,
        }
    }
}
