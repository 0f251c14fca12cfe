use super::{PathFinder, PlannerConfig};
use crate::models::Position;
use crate::restricted::AreaSnapshot;
use crate::spatial::{bearing_deg, distance, heading_index, offset_heading, step_along, HEADING_COUNT};

/// Which pass of the greedy search is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Primary,
    /// Wider deflection and a looser progress bound, with stuck detection
    Relaxed,
}

/// Stuck detection for the relaxed pass.
#[derive(Debug, Clone, Copy)]
struct Progress {
    best: f64,
    stuck: u32,
}

impl Progress {
    fn new(start_distance: f64) -> Self {
        Self {
            best: start_distance,
            stuck: 0,
        }
    }

    /// Progress bound for deflected steps; widens once stuck past `stuck_relax_after`.
    fn tolerance(&self, config: &PlannerConfig) -> f64 {
        if self.stuck > config.stuck_relax_after {
            config.stuck_tolerance
        } else {
            config.progress_tolerance
        }
    }

    /// Record the distance left after a step. `false` once stuck past `stuck_abandon_after`.
    fn record(&mut self, remaining: f64, config: &PlannerConfig) -> bool {
        if remaining < self.best {
            self.best = remaining;
            self.stuck = 0;
            return true;
        }
        self.stuck += 1;
        self.stuck <= config.stuck_abandon_after
    }
}

/// Greedy heading search: step towards the destination, deflect when blocked.
pub struct GreedyPathFinder<'a> {
    areas: &'a AreaSnapshot,
    config: &'a PlannerConfig,
}

impl<'a> GreedyPathFinder<'a> {
    pub fn new(areas: &'a AreaSnapshot, config: &'a PlannerConfig) -> Self {
        Self { areas, config }
    }

    /// Run a single pass of the search.
    pub fn search(&self, start: Position, end: Position, mode: SearchMode) -> Option<Vec<Position>> {
        if self.areas.is_in_restricted_area(end) {
            tracing::debug!(
                "Destination ({}, {}) is inside a restricted area",
                end.lng,
                end.lat
            );
            return None;
        }

        let relaxed = mode == SearchMode::Relaxed;
        let offsets = if relaxed {
            self.config.relaxed_offsets
        } else {
            self.config.primary_offsets
        };

        let mut path = vec![start];
        let mut current = start;
        let mut progress = Progress::new(distance(start, end));
        let mut iterations = 0u32;

        while !self.arrived(current, end) {
            if iterations >= self.config.max_iterations {
                tracing::debug!("{:?} greedy search hit {} iterations", mode, iterations);
                return None;
            }
            iterations += 1;

            let tolerance = if relaxed {
                progress.tolerance(self.config)
            } else {
                self.config.progress_tolerance
            };
            let next = self.next_step(current, end, offsets, tolerance)?;

            if relaxed && !progress.record(distance(next, end), self.config) {
                tracing::debug!(
                    "Relaxed search stuck for {} steps, abandoning",
                    progress.stuck
                );
                return None;
            }

            path.push(next);
            current = next;
        }

        if current != end {
            path.push(end);
        }
        Some(path)
    }

    fn arrived(&self, current: Position, end: Position) -> bool {
        distance(current, end) < self.config.step
            && !self.areas.segment_crosses_restricted_area(current, end)
    }

    fn is_clear(&self, from: Position, to: Position) -> bool {
        !self.areas.segment_crosses_restricted_area(from, to)
    }

    /// Pick the next waypoint: direct heading, then deflections, then any clear heading.
    fn next_step(&self, current: Position, end: Position, offsets: u32, tolerance: f64) -> Option<Position> {
        let step = self.config.step;
        let direct = heading_index(bearing_deg(current, end));
        let candidate = step_along(current, direct, step);
        if self.is_clear(current, candidate) {
            return Some(candidate);
        }

        let before = distance(current, end);
        for k in 1..=offsets as i32 {
            for offset in [-k, k] {
                let candidate = step_along(current, offset_heading(direct, offset), step);
                if self.is_clear(current, candidate) && distance(candidate, end) <= before * tolerance {
                    return Some(candidate);
                }
            }
        }

        (0..HEADING_COUNT)
            .map(|index| step_along(current, index, step))
            .find(|candidate| self.is_clear(current, *candidate))
    }
}

impl PathFinder for GreedyPathFinder<'_> {
    fn find(&self, start: Position, end: Position) -> Option<Vec<Position>> {
        self.search(start, end, SearchMode::Primary).or_else(|| {
            tracing::debug!("Primary greedy search failed, retrying relaxed");
            self.search(start, end, SearchMode::Relaxed)
        })
    }
}
