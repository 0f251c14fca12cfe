//! Fleet route scheduler.
//!
//! Turns a batch of dispatch requests into per-drone flight paths:
//!
//! 1. Try to serve the whole batch with one drone in one A* routed flight.
//! 2. Otherwise hand dispatches out drone by drone, flight by flight, always
//!    flying to the nearest eligible dispatch with the greedy path finder.

use crate::fleet::FleetSource;
use crate::matcher::{self, can_handle_all, fits, AvailabilityBook, EPSILON};
use crate::models::{
    Capability, Dispatch, DispatchRequest, Drone, DroneRoute, FlightAssignment, PlanResult,
    Position, UnplannedDispatch, UnplannedReason,
};
use crate::pathfinding::{AStarPathFinder, GreedyPathFinder, PathFinder, PlannerConfig};
use crate::restricted::{AreaSnapshot, RestrictedAreaIndex};
use crate::spatial::{distance, path_moves, steps_between};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("dispatches must share one date, found {first} and {second}")]
    MixedDates { first: String, second: String },
}

/// Fail when the requests carry more than one distinct non-empty date.
pub fn check_single_date(requests: &[DispatchRequest]) -> Result<(), PlanError> {
    let mut first: Option<&str> = None;
    let dates = requests
        .iter()
        .filter_map(|request| request.date.as_deref())
        .map(str::trim)
        .filter(|date| !date.is_empty());
    for date in dates {
        match first {
            None => first = Some(date),
            Some(seen) if seen != date => {
                return Err(PlanError::MixedDates {
                    first: seen.to_string(),
                    second: date.to_string(),
                })
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Fleet data loaded once per planning call.
struct FleetView {
    drones: Vec<Drone>,
    book: AvailabilityBook,
    bases: HashMap<String, Position>,
    default_base: Position,
}

impl FleetView {
    fn base_for(&self, drone_id: &str) -> Position {
        self.bases
            .get(drone_id)
            .copied()
            .unwrap_or(self.default_base)
    }

    /// Drones by descending capacity, fleet order among equals.
    fn ranked(&self) -> Vec<&Drone> {
        let mut ranked: Vec<&Drone> = self.drones.iter().collect();
        ranked.sort_by(|a, b| b.capability.capacity.total_cmp(&a.capability.capacity));
        ranked
    }
}

struct Leg {
    index: usize,
    path: Vec<Position>,
    moves: u64,
}

struct Flight {
    deliveries: Vec<FlightAssignment>,
    moves: u64,
}

/// Plans batches of dispatches against a fleet and the restricted-area cache.
pub struct DeliveryPlanner<'a> {
    fleet: &'a dyn FleetSource,
    areas: &'a RestrictedAreaIndex,
    config: PlannerConfig,
}

impl<'a> DeliveryPlanner<'a> {
    pub fn new(fleet: &'a dyn FleetSource, areas: &'a RestrictedAreaIndex) -> Self {
        Self {
            fleet,
            areas,
            config: PlannerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    /// Plan a batch of dispatches.
    ///
    /// # Errors
    /// [`PlanError::MixedDates`] when the batch spans more than one date.
    /// Dispatches that cannot be served are reported in
    /// [`PlanResult::unplanned`] instead of failing the call.
    pub fn plan(&self, requests: &[DispatchRequest]) -> Result<PlanResult, PlanError> {
        check_single_date(requests)?;

        let (dispatches, mut unplanned) = split_valid(requests);
        if dispatches.is_empty() {
            tracing::info!("No valid dispatches among {} requests", requests.len());
            return Ok(PlanResult {
                unplanned,
                ..Default::default()
            });
        }

        let fleet = self.load_fleet();
        let snapshot = self.areas.get();
        tracing::debug!(
            "Planning {} dispatches with {} drones and {} restricted areas",
            dispatches.len(),
            fleet.drones.len(),
            snapshot.len()
        );

        let mut result = match self.plan_single_drone(&fleet, &snapshot, &dispatches) {
            Some(result) => result,
            None => self.plan_multi_drone(&fleet, &snapshot, &dispatches),
        };
        unplanned.append(&mut result.unplanned);
        result.unplanned = unplanned;

        tracing::info!(
            "Planned {} of {} dispatches with {} drones: {} moves, cost {:.2}",
            result.planned_ids().len(),
            requests.len(),
            result.drone_paths.len(),
            result.total_moves,
            result.total_cost
        );
        Ok(result)
    }

    /// Ids of the drones able to serve every valid request in the batch.
    pub fn query_available_drones(&self, requests: &[DispatchRequest]) -> Vec<String> {
        let dispatches: Vec<Dispatch> = requests
            .iter()
            .filter_map(DispatchRequest::validate)
            .collect();
        if dispatches.is_empty() {
            return Vec::new();
        }
        let drones = self.fleet.fetch_drones();
        let book = AvailabilityBook::from_records(&self.fleet.fetch_drone_availability());
        matcher::query_available_drones(&drones, &dispatches, &book)
    }

    fn load_fleet(&self) -> FleetView {
        let drones = self.fleet.fetch_drones();
        let service_points = self.fleet.fetch_service_points();
        let availability = self.fleet.fetch_drone_availability();

        let default_base = service_points
            .first()
            .map(|sp| sp.location)
            .unwrap_or(Position::new(0.0, 0.0));

        let mut bases = HashMap::new();
        for record in &availability {
            let Some(sp_id) = record.service_point_id else {
                continue;
            };
            if let Some(sp) = service_points.iter().find(|sp| sp.id == sp_id) {
                bases.entry(record.drone_id.clone()).or_insert(sp.location);
            }
        }

        FleetView {
            drones,
            book: AvailabilityBook::from_records(&availability),
            bases,
            default_base,
        }
    }

    /// Whole batch, one drone, one flight. `None` when no drone manages it.
    fn plan_single_drone(
        &self,
        fleet: &FleetView,
        snapshot: &AreaSnapshot,
        dispatches: &[Dispatch],
    ) -> Option<PlanResult> {
        let total_load: f64 = dispatches.iter().map(|d| d.requirements.capacity).sum();
        let finder = AStarPathFinder::new(snapshot, &self.config);

        for drone in fleet.ranked() {
            if !can_handle_all(drone, dispatches, &fleet.book) {
                continue;
            }
            if total_load > drone.capability.capacity + EPSILON {
                tracing::debug!(
                    "Drone {} cannot carry the whole batch ({} > {})",
                    drone.id,
                    total_load,
                    drone.capability.capacity
                );
                continue;
            }

            let base = fleet.base_for(&drone.id);
            let Some((route, moves)) = self.single_flight(&finder, drone, base, dispatches) else {
                tracing::debug!("Drone {} has no single-flight route for the batch", drone.id);
                continue;
            };

            tracing::info!(
                "Drone {} serves all {} dispatches in one flight ({} moves)",
                drone.id,
                dispatches.len(),
                moves
            );
            return Some(PlanResult {
                total_cost: flight_cost(&drone.capability, moves),
                total_moves: moves,
                drone_paths: vec![route],
                unplanned: Vec::new(),
            });
        }
        None
    }

    fn single_flight(
        &self,
        finder: &dyn PathFinder,
        drone: &Drone,
        base: Position,
        dispatches: &[Dispatch],
    ) -> Option<(DroneRoute, u64)> {
        let budget = u64::from(drone.capability.max_moves);
        let mut deliveries = Vec::with_capacity(dispatches.len());
        let mut moves = 0u64;
        let mut current = base;

        for dispatch in dispatches {
            let mut path = trim_to_destination(finder.find(current, dispatch.delivery)?, dispatch.delivery);
            moves += path_moves(&path);
            if moves > budget {
                return None;
            }
            // Hover marks the drop-off.
            path.push(dispatch.delivery);
            deliveries.push(FlightAssignment {
                delivery_id: dispatch.id,
                flight_path: path,
            });
            current = dispatch.delivery;
        }

        let back = finder.find(current, base)?;
        moves += path_moves(&back);
        if moves > budget {
            return None;
        }
        if let Some(last) = deliveries.last_mut() {
            last.flight_path.extend(back.into_iter().skip(1));
        }

        Some((
            DroneRoute {
                drone_id: drone.id.clone(),
                deliveries,
            },
            moves,
        ))
    }

    /// Drone by drone, flight by flight, nearest dispatch first.
    fn plan_multi_drone(
        &self,
        fleet: &FleetView,
        snapshot: &AreaSnapshot,
        dispatches: &[Dispatch],
    ) -> PlanResult {
        let finder = GreedyPathFinder::new(snapshot, &self.config);
        let mut pending: Vec<usize> = (0..dispatches.len()).collect();
        let mut unreachable: Vec<usize> = Vec::new();
        let mut result = PlanResult::default();
        let max_flights = dispatches.len() + 1;

        for drone in fleet.ranked() {
            if pending.is_empty() {
                break;
            }
            let base = fleet.base_for(&drone.id);
            let mut route = DroneRoute {
                drone_id: drone.id.clone(),
                deliveries: Vec::new(),
            };

            for _ in 0..max_flights {
                if pending.is_empty() {
                    break;
                }
                let Some(flight) = self.fly(
                    &finder,
                    drone,
                    base,
                    dispatches,
                    &fleet.book,
                    &mut pending,
                    &mut unreachable,
                ) else {
                    break;
                };
                tracing::debug!(
                    "Drone {} flight: {} deliveries, {} moves",
                    drone.id,
                    flight.deliveries.len(),
                    flight.moves
                );
                result.total_moves += flight.moves;
                result.total_cost += flight_cost(&drone.capability, flight.moves);
                route.deliveries.extend(flight.deliveries);
            }

            if !route.deliveries.is_empty() {
                result.drone_paths.push(route);
            }
        }

        result.unplanned = (0..dispatches.len())
            .filter_map(|index| {
                let reason = if unreachable.contains(&index) {
                    UnplannedReason::Unreachable
                } else if pending.contains(&index) {
                    UnplannedReason::NoEligibleDrone
                } else {
                    return None;
                };
                Some(UnplannedDispatch {
                    id: dispatches[index].id,
                    reason,
                })
            })
            .collect();
        result
    }

    /// One base-to-base flight. `None` when the drone ends up delivering nothing.
    #[allow(clippy::too_many_arguments)]
    fn fly(
        &self,
        finder: &GreedyPathFinder<'_>,
        drone: &Drone,
        base: Position,
        dispatches: &[Dispatch],
        book: &AvailabilityBook,
        pending: &mut Vec<usize>,
        unreachable: &mut Vec<usize>,
    ) -> Option<Flight> {
        let capability = &drone.capability;
        let mut moves_left = u64::from(capability.max_moves);
        let mut load = 0.0;
        let mut current = base;
        let mut legs: Vec<Leg> = Vec::new();

        let mut candidates: Vec<usize> = pending
            .iter()
            .copied()
            .filter(|&index| {
                let dispatch = &dispatches[index];
                fits(&dispatch.requirements, capability)
                    && can_handle_all(drone, std::slice::from_ref(dispatch), book)
            })
            .collect();

        while let Some(pick) = nearest(current, &candidates, dispatches) {
            let index = candidates.remove(pick);
            let dispatch = &dispatches[index];
            let need = dispatch.requirements.capacity;

            if load + need > capability.capacity + EPSILON {
                continue;
            }

            let Some(path) = finder.find(current, dispatch.delivery) else {
                tracing::warn!(
                    "No path to dispatch {} avoiding restricted areas, dropping it",
                    dispatch.id
                );
                pending.retain(|&i| i != index);
                unreachable.push(index);
                continue;
            };

            let moves = path_moves(&path);
            let home = steps_between(dispatch.delivery, base, self.config.step);
            if moves.saturating_add(home) > moves_left {
                tracing::trace!(
                    "Drone {} lacks moves for dispatch {} ({} + {} > {})",
                    drone.id,
                    dispatch.id,
                    moves,
                    home,
                    moves_left
                );
                continue;
            }

            moves_left -= moves;
            load += need;
            current = dispatch.delivery;
            pending.retain(|&i| i != index);
            legs.push(Leg {
                index,
                path,
                moves,
            });
        }

        // Back off deliveries until the drone can make it home.
        let mut back = None;
        for _ in 0..legs.len() {
            let Some(last) = legs.last() else {
                break;
            };
            let from = dispatches[last.index].delivery;
            match finder.find(from, base) {
                Some(path) if path_moves(&path) <= moves_left => {
                    back = Some(path);
                    break;
                }
                _ => {
                    let Some(leg) = legs.pop() else {
                        break;
                    };
                    tracing::debug!(
                        "Drone {} cannot return after dispatch {}, putting it back",
                        drone.id,
                        dispatches[leg.index].id
                    );
                    moves_left += leg.moves;
                    let at = pending.partition_point(|&i| i < leg.index);
                    pending.insert(at, leg.index);
                }
            }
        }
        let back = back?;

        let moves = legs.iter().map(|leg| leg.moves).sum::<u64>() + path_moves(&back);
        let mut deliveries: Vec<FlightAssignment> = legs
            .into_iter()
            .map(|leg| {
                let mut flight_path = leg.path;
                let delivery = dispatches[leg.index].delivery;
                flight_path.push(delivery);
                FlightAssignment {
                    delivery_id: dispatches[leg.index].id,
                    flight_path,
                }
            })
            .collect();
        if let Some(last) = deliveries.last_mut() {
            last.flight_path.extend(back.into_iter().skip(1));
        }

        Some(Flight { deliveries, moves })
    }
}

/// Valid dispatches, plus the ids of invalid requests that carry one.
fn split_valid(requests: &[DispatchRequest]) -> (Vec<Dispatch>, Vec<UnplannedDispatch>) {
    let mut dispatches = Vec::with_capacity(requests.len());
    let mut invalid = Vec::new();
    for request in requests {
        match request.validate() {
            Some(dispatch) => dispatches.push(dispatch),
            None => {
                tracing::debug!("Skipping invalid dispatch request {:?}", request.id);
                if let Some(id) = request.id {
                    invalid.push(UnplannedDispatch {
                        id,
                        reason: UnplannedReason::Invalid,
                    });
                }
            }
        }
    }
    (dispatches, invalid)
}

/// Position in `candidates` of the dispatch nearest to `from`; first wins on ties.
fn nearest(from: Position, candidates: &[usize], dispatches: &[Dispatch]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (slot, &index) in candidates.iter().enumerate() {
        let d = distance(from, dispatches[index].delivery);
        if best.map_or(true, |(_, best_d)| d < best_d) {
            best = Some((slot, d));
        }
    }
    best.map(|(slot, _)| slot)
}

/// Cut a path at its waypoint closest to `destination` and make sure it ends there exactly.
fn trim_to_destination(mut path: Vec<Position>, destination: Position) -> Vec<Position> {
    let closest = path
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| distance(**a, destination).total_cmp(&distance(**b, destination)))
        .map(|(index, _)| index);
    if let Some(index) = closest {
        path.truncate(index + 1);
    }
    if path.last() != Some(&destination) {
        path.push(destination);
    }
    path
}

pub fn flight_cost(capability: &Capability, moves: u64) -> f64 {
    capability.cost_initial + capability.cost_final + moves as f64 * capability.cost_per_move
}
