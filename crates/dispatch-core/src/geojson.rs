//! GeoJSON rendering of planned routes.

use crate::models::PlanResult;
use serde_json::{json, Value};

/// Render a plan as a `FeatureCollection` with one `LineString` per drone.
pub fn plan_to_geojson(plan: &PlanResult) -> Value {
    let features: Vec<Value> = plan
        .drone_paths
        .iter()
        .map(|route| {
            let coordinates: Vec<[f64; 2]> = route
                .deliveries
                .iter()
                .flat_map(|delivery| delivery.flight_path.iter())
                .map(|pos| [pos.lng, pos.lat])
                .collect();
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "LineString",
                    "coordinates": coordinates,
                },
                "properties": {
                    "droneId": route.drone_id,
                    "deliveryCount": route.deliveries.len(),
                },
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "features": features,
        "properties": {
            "totalMoves": plan.total_moves,
            "totalCost": plan.total_cost,
            "droneCount": plan.drone_paths.len(),
        },
    })
}
