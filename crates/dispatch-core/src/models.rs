//! Core data models for delivery planning.
//!
//! Wire names follow the upstream drone data service (camelCase JSON).

use serde::{Deserialize, Serialize};

/// Planar coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lng: f64,
    pub lat: f64,
}

impl Position {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// What a drone can carry and what it costs to fly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Capability {
    pub cooling: bool,
    pub heating: bool,
    pub capacity: f64,
    /// Move budget for a single flight (base to base)
    pub max_moves: u32,
    pub cost_per_move: f64,
    pub cost_initial: f64,
    pub cost_final: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drone {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub capability: Capability,
}

/// Payload requirements of a single dispatch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirements {
    #[serde(default)]
    pub capacity: f64,
    #[serde(default)]
    pub cooling: bool,
    #[serde(default)]
    pub heating: bool,
    /// Upper bound on the fixed part of a flight's cost
    #[serde(default)]
    pub max_cost: Option<f64>,
}

/// A delivery request as submitted; any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRequest {
    pub id: Option<u32>,
    /// Calendar date, `YYYY-MM-DD`
    pub date: Option<String>,
    /// Time of day, `HH:mm` or `HH:mm:ss`
    pub time: Option<String>,
    pub requirements: Option<Requirements>,
    pub delivery: Option<Position>,
}

impl DispatchRequest {
    /// Return the plannable form of this request, or `None` when the id,
    /// requirements or delivery position is missing.
    pub fn validate(&self) -> Option<Dispatch> {
        Some(Dispatch {
            id: self.id?,
            date: self.date.clone().filter(|value| !value.trim().is_empty()),
            time: self.time.clone().filter(|value| !value.trim().is_empty()),
            requirements: self.requirements.clone()?,
            delivery: self.delivery?,
        })
    }
}

/// A validated dispatch ready for planning.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub id: u32,
    pub date: Option<String>,
    pub time: Option<String>,
    pub requirements: Requirements,
    pub delivery: Position,
}

impl Dispatch {
    pub fn new(id: u32, requirements: Requirements, delivery: Position) -> Self {
        Self {
            id,
            date: None,
            time: None,
            requirements,
            delivery,
        }
    }

    /// Attach a scheduled date and time of day.
    pub fn at(mut self, date: impl Into<String>, time: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self.time = Some(time.into());
        self
    }
}

/// Vertical extent of a restricted area. Not used by the planar planner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AltitudeLimits {
    pub lower: f64,
    pub upper: f64,
}

/// A no-fly polygon. Vertices form a closed ring (first == last).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestrictedArea {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: Option<u32>,
    #[serde(default)]
    pub limits: Option<AltitudeLimits>,
    #[serde(default)]
    pub vertices: Vec<Position>,
}

/// A named polygon used for ad-hoc membership checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    #[serde(default)]
    pub name: String,
    pub vertices: Vec<Position>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicePoint {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    pub location: Position,
}

/// A weekly availability slot for one drone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    /// Upper-case weekday name, e.g. `MONDAY`
    pub day_of_week: String,
    pub from: String,
    pub until: String,
}

/// Availability windows of a drone, and the service point it operates from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DroneAvailability {
    pub drone_id: String,
    #[serde(default)]
    pub service_point_id: Option<u32>,
    #[serde(default)]
    pub windows: Vec<TimeWindow>,
}

/// Flight path flown for a single delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightAssignment {
    pub delivery_id: u32,
    pub flight_path: Vec<Position>,
}

/// All deliveries served by one drone, across one or more flights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DroneRoute {
    pub drone_id: String,
    pub deliveries: Vec<FlightAssignment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnplannedReason {
    /// Missing id, requirements or delivery position
    Invalid,
    /// No drone could take it within capability, availability and move budget
    NoEligibleDrone,
    /// No path avoiding restricted areas was found
    Unreachable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnplannedDispatch {
    pub id: u32,
    pub reason: UnplannedReason,
}

/// Outcome of planning one batch of dispatches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResult {
    pub total_cost: f64,
    pub total_moves: u64,
    pub drone_paths: Vec<DroneRoute>,
    #[serde(default)]
    pub unplanned: Vec<UnplannedDispatch>,
}

impl PlanResult {
    /// Ids of every delivery that made it into a route.
    pub fn planned_ids(&self) -> Vec<u32> {
        self.drone_paths
            .iter()
            .flat_map(|route| route.deliveries.iter().map(|d| d.delivery_id))
            .collect()
    }

    pub fn is_fully_planned(&self) -> bool {
        self.unplanned.is_empty()
    }
}
