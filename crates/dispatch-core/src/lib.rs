pub mod fleet;
pub mod geofence;
pub mod geojson;
pub mod matcher;
pub mod models;
pub mod pathfinding;
pub mod query;
pub mod restricted;
pub mod scheduler;
pub mod spatial;

pub use fleet::{FleetSource, StaticFleet};
pub use geofence::{is_in_region, point_in_polygon, validate_ring, InvalidPolygon};
pub use geojson::plan_to_geojson;
pub use matcher::{can_handle_all, fits, query_available_drones, AvailabilityBook};
pub use models::{
    AltitudeLimits, Capability, Dispatch, DispatchRequest, Drone, DroneAvailability, DroneRoute,
    FlightAssignment, PlanResult, Position, Region, Requirements, RestrictedArea, ServicePoint,
    TimeWindow, UnplannedDispatch, UnplannedReason,
};
pub use pathfinding::{AStarPathFinder, GreedyPathFinder, PathFinder, PlannerConfig, SearchMode};
pub use query::{query, query_as_path, AttributeValue, Operator, QueryFilter};
pub use restricted::{AreaSnapshot, RestrictedAreaIndex, RestrictedAreaSource};
pub use scheduler::{check_single_date, DeliveryPlanner, PlanError};
pub use spatial::{distance, is_close, next_position, STEP};
