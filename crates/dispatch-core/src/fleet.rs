//! Fleet data sources.

use crate::models::{Drone, DroneAvailability, RestrictedArea, ServicePoint};
use crate::restricted::RestrictedAreaSource;
use serde::{Deserialize, Serialize};

/// Supplier of drones, service points and availability windows.
///
/// Implementations return empty collections when the upstream is unavailable.
pub trait FleetSource: Send + Sync {
    fn fetch_drones(&self) -> Vec<Drone>;

    /// Service points; the first one is the default base.
    fn fetch_service_points(&self) -> Vec<ServicePoint>;

    fn fetch_drone_availability(&self) -> Vec<DroneAvailability>;

    fn find_drone(&self, id: &str) -> Option<Drone> {
        self.fetch_drones().into_iter().find(|drone| drone.id == id)
    }
}

/// In-memory fleet, loaded from a JSON document or built in code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StaticFleet {
    pub drones: Vec<Drone>,
    pub service_points: Vec<ServicePoint>,
    pub restricted_areas: Vec<RestrictedArea>,
    pub availability: Vec<DroneAvailability>,
}

impl StaticFleet {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

impl FleetSource for StaticFleet {
    fn fetch_drones(&self) -> Vec<Drone> {
        self.drones.clone()
    }

    fn fetch_service_points(&self) -> Vec<ServicePoint> {
        self.service_points.clone()
    }

    fn fetch_drone_availability(&self) -> Vec<DroneAvailability> {
        self.availability.clone()
    }
}

impl RestrictedAreaSource for StaticFleet {
    fn fetch_restricted_areas(&self) -> Vec<RestrictedArea> {
        self.restricted_areas.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fleet_document() {
        let raw = r#"{
            "drones": [{"id": "1", "name": "Alpha", "capability": {"capacity": 4.0, "maxMoves": 2000}}],
            "servicePoints": [{"id": 1, "name": "Appleton", "location": {"lng": -3.18, "lat": 55.98}}],
            "availability": [{"droneId": "1", "servicePointId": 1,
                "windows": [{"dayOfWeek": "MONDAY", "from": "00:00", "until": "23:59"}]}]
        }"#;
        let fleet = StaticFleet::from_json(raw).unwrap();
        assert_eq!(fleet.fetch_drones().len(), 1);
        assert!(fleet.fetch_restricted_areas().is_empty());
        assert_eq!(fleet.find_drone("1").map(|d| d.name), Some("Alpha".to_string()));
        assert!(fleet.find_drone("2").is_none());
    }
}
