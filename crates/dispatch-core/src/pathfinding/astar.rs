use super::{PathFinder, PlannerConfig};
use crate::models::Position;
use crate::restricted::AreaSnapshot;
use crate::spatial::{distance, step_along, HEADING_COUNT};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Positions that round to the same `step / GRID_DIVISIONS` cell share a search node.
const GRID_DIVISIONS: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodeKey {
    x: i64,
    y: i64,
}

#[derive(Debug, Clone, Copy)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    key: NodeKey,
    g_score: FloatOrd,
    h_score: FloatOrd,
    f_score: FloatOrd,
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Equal total cost: prefer the node nearer the goal.
        self.f_score
            .cmp(&other.f_score)
            .then_with(|| self.h_score.cmp(&other.h_score))
            .then_with(|| self.key.x.cmp(&other.key.x))
            .then_with(|| self.key.y.cmp(&other.key.y))
            .then_with(|| self.g_score.cmp(&other.g_score))
    }
}

/// A* over the 16-heading move graph with a straight-line heuristic.
pub struct AStarPathFinder<'a> {
    areas: &'a AreaSnapshot,
    config: &'a PlannerConfig,
}

impl<'a> AStarPathFinder<'a> {
    pub fn new(areas: &'a AreaSnapshot, config: &'a PlannerConfig) -> Self {
        Self { areas, config }
    }

    fn key(&self, pos: Position) -> NodeKey {
        let cell = self.config.step / GRID_DIVISIONS;
        NodeKey {
            x: (pos.lng / cell).round() as i64,
            y: (pos.lat / cell).round() as i64,
        }
    }

    fn is_goal(&self, pos: Position, end: Position) -> bool {
        distance(pos, end) < self.config.step
            && !self.areas.segment_crosses_restricted_area(pos, end)
    }
}

impl PathFinder for AStarPathFinder<'_> {
    fn find(&self, start: Position, end: Position) -> Option<Vec<Position>> {
        if self.areas.is_in_restricted_area(end) {
            tracing::debug!(
                "Destination ({}, {}) is inside a restricted area",
                end.lng,
                end.lat
            );
            return None;
        }

        let step = self.config.step;
        let start_key = self.key(start);
        let start_h = distance(start, end);

        let mut open_set: BinaryHeap<Reverse<OpenNode>> = BinaryHeap::new();
        open_set.push(Reverse(OpenNode {
            key: start_key,
            g_score: FloatOrd(0.0),
            h_score: FloatOrd(start_h),
            f_score: FloatOrd(start_h),
        }));
        let mut closed_set: HashSet<NodeKey> = HashSet::new();
        let mut g_score: HashMap<NodeKey, f64> = HashMap::new();
        let mut positions: HashMap<NodeKey, Position> = HashMap::new();
        let mut came_from: HashMap<NodeKey, NodeKey> = HashMap::new();
        g_score.insert(start_key, 0.0);
        positions.insert(start_key, start);

        let mut final_key: Option<NodeKey> = None;
        let mut nodes_visited = 0usize;

        while let Some(Reverse(current)) = open_set.pop() {
            let current_key = current.key;
            if closed_set.contains(&current_key) {
                continue;
            }
            let best_g = g_score.get(&current_key).copied().unwrap_or(f64::INFINITY);
            if current.g_score.0 > best_g + 1e-15 {
                continue;
            }
            let Some(&current_pos) = positions.get(&current_key) else {
                continue;
            };

            nodes_visited += 1;
            if nodes_visited > self.config.astar_max_expansions {
                tracing::debug!("A* gave up after {} expansions", self.config.astar_max_expansions);
                return None;
            }

            if self.is_goal(current_pos, end) {
                final_key = Some(current_key);
                break;
            }

            closed_set.insert(current_key);

            for heading in 0..HEADING_COUNT {
                let next_pos = step_along(current_pos, heading, step);
                let next_key = self.key(next_pos);
                if closed_set.contains(&next_key) {
                    continue;
                }

                let tentative_g = best_g + step;
                if tentative_g >= g_score.get(&next_key).copied().unwrap_or(f64::INFINITY) {
                    continue;
                }
                if self.areas.segment_crosses_restricted_area(current_pos, next_pos) {
                    continue;
                }

                came_from.insert(next_key, current_key);
                g_score.insert(next_key, tentative_g);
                positions.insert(next_key, next_pos);

                let h_score = distance(next_pos, end);
                open_set.push(Reverse(OpenNode {
                    key: next_key,
                    g_score: FloatOrd(tentative_g),
                    h_score: FloatOrd(h_score),
                    f_score: FloatOrd(tentative_g + h_score),
                }));
            }
        }

        let Some(final_key) = final_key else {
            tracing::debug!("A* exhausted the search after {} expansions", nodes_visited);
            return None;
        };

        let mut path = Vec::new();
        let mut current = Some(final_key);
        while let Some(key) = current {
            if let Some(&pos) = positions.get(&key) {
                path.push(pos);
            }
            current = came_from.get(&key).copied();
        }
        path.reverse();

        if path.last() != Some(&end) {
            path.push(end);
        }
        tracing::trace!("A* found {} waypoints in {} expansions", path.len(), nodes_visited);
        Some(path)
    }
}
