pub mod client_requests;
pub mod drivers;
pub mod search;
pub mod ws;

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(drivers::router())
        .merge(client_requests::router())
        .merge(search::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Coordinates that must be present and in range.
pub(crate) fn checked_point(lat: f64, lon: f64) -> Result<GeoPoint, AppError> {
    let point = GeoPoint::new(lat, lon);
    if point.is_valid() {
        Ok(point)
    } else {
        Err(AppError::BadRequest(format!("coordinates out of range: {lat}, {lon}")))
    }
}

/// Home coordinates where zero means "not shared".
pub(crate) fn optional_home(lat: f64, lon: f64) -> Result<Option<GeoPoint>, AppError> {
    GeoPoint::from_raw(lat, lon)
        .map(|point| checked_point(point.lat, point.lon))
        .transpose()
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    drivers: usize,
    driver_requests: usize,
    client_requests: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        drivers: state.store.driver_count(),
        driver_requests: state.store.driver_request_count(),
        client_requests: state.store.client_request_count(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
