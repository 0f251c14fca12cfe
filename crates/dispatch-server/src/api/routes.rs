//! REST API routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use dispatch_core::{
    is_in_region, next_position, plan_to_geojson, query, spatial, DispatchRequest, Drone,
    PlanResult, Position, QueryFilter, Region,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api::error::{ApiError, ApiResult};
use crate::api::request_id;
use crate::state::AppState;

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    let v1 = Router::new()
        // Geometry helpers
        .route("/distanceTo", post(distance_to))
        .route("/isCloseTo", post(is_close_to))
        .route("/nextPosition", post(next_position_handler))
        .route("/isInRegion", post(is_in_region_handler))
        // Fleet lookups
        .route("/dronesWithCooling/:state", get(drones_with_cooling))
        .route("/droneDetails/:id", get(drone_details))
        .route("/queryAsPath/:attribute/:value", get(query_as_path))
        .route("/query", post(query_drones))
        .route("/queryAvailableDrones", post(query_available_drones))
        // Planning
        .route("/calcDeliveryPath", post(calc_delivery_path))
        .route("/calcDeliveryPathAsGeoJson", post(calc_delivery_path_as_geojson))
        .route("/restrictedAreas/invalidate", post(invalidate_restricted_areas));

    Router::new()
        .nest("/api/v1", v1)
        .route("/health", get(|| async { "OK" }))
        .layer(middleware::from_fn(request_id::ensure_request_id))
        .layer(TraceLayer::new_for_http())
}

#[derive(Debug, Deserialize)]
struct DistanceRequest {
    position1: Position,
    position2: Position,
}

#[derive(Debug, Deserialize)]
struct NextPositionRequest {
    start: Position,
    angle: f64,
}

#[derive(Debug, Deserialize)]
struct RegionRequest {
    position: Position,
    region: Region,
}

async fn distance_to(Json(request): Json<DistanceRequest>) -> Json<f64> {
    Json(spatial::distance(request.position1, request.position2))
}

async fn is_close_to(Json(request): Json<DistanceRequest>) -> Json<bool> {
    Json(spatial::is_close(request.position1, request.position2))
}

async fn next_position_handler(Json(request): Json<NextPositionRequest>) -> ApiResult<Json<Position>> {
    next_position(request.start, request.angle)
        .map(Json)
        .ok_or_else(|| {
            ApiError::InvalidInput(format!("angle {} is not an allowed heading", request.angle))
        })
}

async fn is_in_region_handler(Json(request): Json<RegionRequest>) -> ApiResult<Json<bool>> {
    Ok(Json(is_in_region(request.position, &request.region)?))
}

async fn drones_with_cooling(
    State(state): State<Arc<AppState>>,
    Path(cooling): Path<bool>,
) -> ApiResult<Json<Vec<String>>> {
    let ids = tokio::task::spawn_blocking(move || {
        query::drones_with_cooling(&state.fleet().fetch_drones(), cooling)
    })
    .await?;
    Ok(Json(ids))
}

async fn drone_details(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Drone>> {
    let lookup = id.clone();
    let drone = tokio::task::spawn_blocking(move || state.fleet().find_drone(&lookup)).await?;
    drone
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("drone {} not found", id)))
}

async fn query_as_path(
    State(state): State<Arc<AppState>>,
    Path((attribute, value)): Path<(String, String)>,
) -> ApiResult<Json<Vec<String>>> {
    let ids = tokio::task::spawn_blocking(move || {
        query::query_as_path(&state.fleet().fetch_drones(), &attribute, &value)
    })
    .await?;
    Ok(Json(ids))
}

async fn query_drones(
    State(state): State<Arc<AppState>>,
    Json(filters): Json<Vec<QueryFilter>>,
) -> ApiResult<Json<Vec<String>>> {
    let ids = tokio::task::spawn_blocking(move || {
        query::query(&state.fleet().fetch_drones(), &filters)
    })
    .await?;
    Ok(Json(ids))
}

async fn query_available_drones(
    State(state): State<Arc<AppState>>,
    Json(requests): Json<Vec<DispatchRequest>>,
) -> ApiResult<Json<Vec<String>>> {
    let ids =
        tokio::task::spawn_blocking(move || state.planner().query_available_drones(&requests))
            .await?;
    Ok(Json(ids))
}

async fn plan(state: Arc<AppState>, requests: Vec<DispatchRequest>) -> ApiResult<PlanResult> {
    let result = tokio::task::spawn_blocking(move || state.planner().plan(&requests)).await??;
    Ok(result)
}

async fn calc_delivery_path(
    State(state): State<Arc<AppState>>,
    Json(requests): Json<Vec<DispatchRequest>>,
) -> ApiResult<Json<PlanResult>> {
    Ok(Json(plan(state, requests).await?))
}

async fn calc_delivery_path_as_geojson(
    State(state): State<Arc<AppState>>,
    Json(requests): Json<Vec<DispatchRequest>>,
) -> ApiResult<Json<Value>> {
    let result = plan(state, requests).await?;
    Ok(Json(plan_to_geojson(&result)))
}

async fn invalidate_restricted_areas(State(state): State<Arc<AppState>>) -> StatusCode {
    state.areas().invalidate();
    StatusCode::NO_CONTENT
}
