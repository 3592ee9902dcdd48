use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::routing::get;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::rest::checked_point;
use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::client::ClientRequest;
use crate::models::driver::DriverOffer;
use crate::search::offers::offers_near;
use crate::search::orchestrator::{SearchMode, SearchQuery, SearchType, search};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/search", get(search_requests))
        .route("/offers", get(offer_board))
        .route("/offers/matching", get(matching_offers))
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub telegram_id: i64,
    pub search_type: Option<String>,
    pub driver_lat: Option<f64>,
    pub driver_lon: Option<f64>,
    pub radius: Option<f64>,
    pub from_city: Option<String>,
    pub to_city: Option<String>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub requests: Vec<ClientRequest>,
    pub search_type: String,
    pub mode: SearchMode,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_start_city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_start_location: Option<GeoPoint>,
}

#[derive(Deserialize)]
pub struct MatchingParams {
    pub from_lat: f64,
    pub from_lon: f64,
}

async fn search_requests(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let requested = params.search_type.unwrap_or_default();
    let location = GeoPoint::from_raw(
        params.driver_lat.unwrap_or_default(),
        params.driver_lon.unwrap_or_default(),
    );
    if location.is_some_and(|point| !point.is_valid()) {
        return Err(AppError::BadRequest("driver coordinates out of range".to_string()));
    }

    let query = SearchQuery {
        requester_id: params.telegram_id,
        search_type: SearchType::parse(&requested),
        location,
        radius_km: params.radius,
        from_city: params.from_city,
        to_city: params.to_city,
    };

    info!(
        telegram_id = query.requester_id,
        search_type = %requested,
        radius_km = query.radius(),
        "driver search request"
    );

    let outcome = search::<ClientRequest, _, _>(&state.store, &state.store, &query)?;
    state
        .metrics
        .searches_total
        .with_label_values(&[outcome.mode.as_str()])
        .inc();

    let (driver_start_city, driver_start_location) = match outcome.requester {
        Some(driver) => (Some(driver.start_city), driver.home),
        None => (None, None),
    };

    Ok(Json(SearchResponse {
        success: true,
        count: outcome.results.len(),
        requests: outcome.results,
        search_type: requested,
        mode: outcome.mode,
        driver_start_city,
        driver_start_location,
    }))
}

async fn offer_board(State(state): State<Arc<AppState>>) -> Json<Vec<DriverOffer>> {
    Json(state.store.offer_board())
}

async fn matching_offers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MatchingParams>,
) -> Result<Json<Vec<DriverOffer>>, AppError> {
    let pickup = checked_point(params.from_lat, params.from_lon)?;
    Ok(Json(offers_near(&state.store, &pickup)?))
}
