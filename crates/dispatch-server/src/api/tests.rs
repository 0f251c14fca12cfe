use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use dispatch_core::{
    Capability, Drone, PlannerConfig, Position, RestrictedArea, ServicePoint, StaticFleet, STEP,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::{api, state::AppState};

fn fleet() -> StaticFleet {
    StaticFleet {
        drones: vec![
            Drone {
                id: "1".to_string(),
                name: "Drone 1".to_string(),
                capability: Capability {
                    cooling: true,
                    heating: true,
                    capacity: 4.0,
                    max_moves: 2000,
                    cost_per_move: 0.01,
                    cost_initial: 4.3,
                    cost_final: 6.5,
                },
            },
            Drone {
                id: "2".to_string(),
                name: "Drone 2".to_string(),
                capability: Capability {
                    heating: true,
                    capacity: 8.0,
                    max_moves: 1000,
                    cost_per_move: 0.03,
                    cost_initial: 2.6,
                    cost_final: 5.4,
                    ..Default::default()
                },
            },
        ],
        service_points: vec![ServicePoint {
            id: 1,
            name: "Appleton Tower".to_string(),
            location: Position::new(0.0, 0.0),
        }],
        restricted_areas: vec![RestrictedArea {
            name: "George Square".to_string(),
            id: Some(1),
            limits: None,
            vertices: vec![
                Position::new(1.0, 1.0),
                Position::new(1.0, 2.0),
                Position::new(2.0, 2.0),
                Position::new(2.0, 1.0),
                Position::new(1.0, 1.0),
            ],
        }],
        availability: Vec::new(),
    }
}

fn setup_app() -> axum::Router {
    let fleet = Arc::new(fleet());
    let state = Arc::new(AppState::new(
        fleet.clone(),
        fleet,
        PlannerConfig {
            max_iterations: 2_000,
            astar_max_expansions: 5_000,
            ..Default::default()
        },
    ));
    api::routes().with_state(state)
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_check_and_request_id() {
    let app = setup_app();

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let tagged = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(tagged).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-42");
}

#[tokio::test]
async fn geometry_endpoints() {
    let app = setup_app();

    let distance = app
        .clone()
        .oneshot(post_json(
            "/api/v1/distanceTo",
            json!({"position1": {"lng": 0.0, "lat": 0.0}, "position2": {"lng": 3.0, "lat": 4.0}}),
        ))
        .await
        .unwrap();
    assert_eq!(distance.status(), StatusCode::OK);
    let value = read_json(distance).await.as_f64().unwrap();
    assert!((value - 5.0).abs() < 1e-9);

    let close = app
        .clone()
        .oneshot(post_json(
            "/api/v1/isCloseTo",
            json!({"position1": {"lng": 0.0, "lat": 0.0}, "position2": {"lng": 0.0001, "lat": 0.0}}),
        ))
        .await
        .unwrap();
    assert_eq!(read_json(close).await, json!(true));

    let next = app
        .clone()
        .oneshot(post_json(
            "/api/v1/nextPosition",
            json!({"start": {"lng": 0.0, "lat": 0.0}, "angle": 90.0}),
        ))
        .await
        .unwrap();
    assert_eq!(next.status(), StatusCode::OK);
    let body = read_json(next).await;
    assert!((body["lat"].as_f64().unwrap() - STEP).abs() < 1e-12);

    let bad_angle = app
        .oneshot(post_json(
            "/api/v1/nextPosition",
            json!({"start": {"lng": 0.0, "lat": 0.0}, "angle": 10.0}),
        ))
        .await
        .unwrap();
    assert_eq!(bad_angle.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn region_check_rejects_open_polygons() {
    let app = setup_app();
    let square = json!([
        {"lng": 0.0, "lat": 0.0}, {"lng": 0.0, "lat": 1.0},
        {"lng": 1.0, "lat": 1.0}, {"lng": 1.0, "lat": 0.0}, {"lng": 0.0, "lat": 0.0}
    ]);

    let inside = app
        .clone()
        .oneshot(post_json(
            "/api/v1/isInRegion",
            json!({"position": {"lng": 1.0, "lat": 0.5}, "region": {"name": "central", "vertices": square}}),
        ))
        .await
        .unwrap();
    assert_eq!(read_json(inside).await, json!(true));

    let open = app
        .oneshot(post_json(
            "/api/v1/isInRegion",
            json!({"position": {"lng": 0.5, "lat": 0.5}, "region": {"name": "open", "vertices": [
                {"lng": 0.0, "lat": 0.0}, {"lng": 0.0, "lat": 1.0},
                {"lng": 1.0, "lat": 1.0}, {"lng": 1.0, "lat": 0.0}
            ]}}),
        ))
        .await
        .unwrap();
    assert_eq!(open.status(), StatusCode::BAD_REQUEST);
    let body = read_json(open).await;
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn drone_lookups() {
    let app = setup_app();

    let cooling = app.clone().oneshot(get("/api/v1/dronesWithCooling/true")).await.unwrap();
    assert_eq!(read_json(cooling).await, json!(["1"]));

    let details = app.clone().oneshot(get("/api/v1/droneDetails/2")).await.unwrap();
    assert_eq!(details.status(), StatusCode::OK);
    let body = read_json(details).await;
    assert_eq!(body["name"], "Drone 2");
    assert_eq!(body["capability"]["maxMoves"], 1000);

    let missing = app.clone().oneshot(get("/api/v1/droneDetails/99")).await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let by_path = app.clone().oneshot(get("/api/v1/queryAsPath/capacity/8")).await.unwrap();
    assert_eq!(read_json(by_path).await, json!(["2"]));

    let filtered = app
        .oneshot(post_json(
            "/api/v1/query",
            json!([
                {"attribute": "heating", "operator": "=", "value": "true"},
                {"attribute": "costPerMove", "operator": "<", "value": "0.02"}
            ]),
        ))
        .await
        .unwrap();
    assert_eq!(read_json(filtered).await, json!(["1"]));
}

#[tokio::test]
async fn available_drones_for_cold_dispatch() {
    let app = setup_app();
    let response = app
        .oneshot(post_json(
            "/api/v1/queryAvailableDrones",
            json!([{
                "id": 1,
                "requirements": {"capacity": 2.0, "cooling": true},
                "delivery": {"lng": 0.001, "lat": 0.0}
            }]),
        ))
        .await
        .unwrap();
    assert_eq!(read_json(response).await, json!(["1"]));
}

#[tokio::test]
async fn delivery_path_and_geojson() {
    let app = setup_app();
    let dispatches = json!([
        {"id": 1, "requirements": {"capacity": 1.0}, "delivery": {"lng": STEP * 10.5, "lat": 0.0}},
        {"id": 2, "requirements": {"capacity": 1.0}, "delivery": {"lng": STEP * 25.8, "lat": 0.0}}
    ]);

    let response = app
        .clone()
        .oneshot(post_json("/api/v1/calcDeliveryPath", dispatches.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["totalMoves"], 53);
    assert_eq!(body["dronePaths"].as_array().unwrap().len(), 1);
    assert_eq!(body["dronePaths"][0]["deliveries"][0]["deliveryId"], 1);
    assert_eq!(body["unplanned"], json!([]));

    let geojson = app
        .oneshot(post_json("/api/v1/calcDeliveryPathAsGeoJson", dispatches))
        .await
        .unwrap();
    let body = read_json(geojson).await;
    assert_eq!(body["type"], "FeatureCollection");
    assert_eq!(body["properties"]["totalMoves"], 53);
    assert_eq!(body["features"][0]["geometry"]["type"], "LineString");
}

#[tokio::test]
async fn mixed_dates_are_a_bad_request() {
    let app = setup_app();
    let response = app
        .oneshot(post_json(
            "/api/v1/calcDeliveryPath",
            json!([
                {"id": 1, "date": "2025-01-01", "requirements": {"capacity": 1.0}, "delivery": {"lng": 0.001, "lat": 0.0}},
                {"id": 2, "date": "2025-01-02", "requirements": {"capacity": 1.0}, "delivery": {"lng": 0.002, "lat": 0.0}}
            ]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("2025-01-02"));
}

#[tokio::test]
async fn invalidating_restricted_areas_returns_no_content() {
    let app = setup_app();
    let response = app
        .oneshot(post_json("/api/v1/restrictedAreas/invalidate", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
