use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::api::rest::{checked_point, optional_home};
use crate::engine::notify::spawn_registration_confirmation;
use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::RequestStatus;
use crate::models::driver::{Driver, DriverRequest};
use crate::state::AppState;
use crate::store::DriverDirectory;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers", post(register_driver))
        .route("/drivers/:telegram_id", get(get_driver).patch(update_driver))
        .route("/drivers/:telegram_id/requests", get(list_driver_requests))
        .route("/driver-requests", post(create_driver_request))
        .route("/driver-requests/:id/status", patch(update_driver_request_status))
}

#[derive(Deserialize)]
pub struct RegisterDriverRequest {
    pub telegram_id: i64,
    pub full_name: String,
    pub contact: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub start_city: String,
    #[serde(default)]
    pub start_lat: f64,
    #[serde(default)]
    pub start_lon: f64,
    #[serde(default = "default_paid")]
    pub paid: bool,
}

fn default_paid() -> bool {
    true
}

/// Partial profile update; absent fields keep their stored value.
#[derive(Deserialize)]
pub struct UpdateDriverRequest {
    pub full_name: Option<String>,
    pub contact: Option<String>,
    pub gender: Option<String>,
    pub start_city: Option<String>,
    pub start_lat: Option<f64>,
    pub start_lon: Option<f64>,
    pub paid: Option<bool>,
}

#[derive(Deserialize)]
pub struct CreateDriverRequestPayload {
    pub telegram_id: i64,
    pub from_address: String,
    pub to_address: String,
    pub from_lat: f64,
    pub from_lon: f64,
    pub to_lat: f64,
    pub to_lon: f64,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub comment: String,
    pub departure_time: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: RequestStatus,
}

async fn register_driver(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterDriverRequest>,
) -> Result<Json<Driver>, AppError> {
    if payload.full_name.trim().is_empty() {
        return Err(AppError::BadRequest("full_name cannot be empty".to_string()));
    }

    let now = Utc::now();
    let driver = state.store.upsert_driver(Driver {
        telegram_id: payload.telegram_id,
        full_name: payload.full_name,
        contact: payload.contact,
        gender: payload.gender,
        start_city: payload.start_city,
        home: optional_home(payload.start_lat, payload.start_lon)?,
        paid: payload.paid,
        created_at: now,
        updated_at: now,
    });

    info!(driver_id = driver.telegram_id, has_home = driver.home.is_some(), "driver registered");
    spawn_registration_confirmation(&state, driver.telegram_id);

    Ok(Json(driver))
}

async fn get_driver(
    State(state): State<Arc<AppState>>,
    Path(telegram_id): Path<i64>,
) -> Result<Json<Driver>, AppError> {
    state
        .store
        .find_driver(telegram_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("driver {telegram_id} not found")))
}

async fn update_driver(
    State(state): State<Arc<AppState>>,
    Path(telegram_id): Path<i64>,
    Json(payload): Json<UpdateDriverRequest>,
) -> Result<Json<Driver>, AppError> {
    let mut driver = state
        .store
        .find_driver(telegram_id)
        .ok_or_else(|| AppError::NotFound(format!("driver {telegram_id} not found")))?;

    if let Some(full_name) = payload.full_name.filter(|name| !name.trim().is_empty()) {
        driver.full_name = full_name;
    }
    if let Some(contact) = payload.contact {
        driver.contact = contact;
    }
    if let Some(gender) = payload.gender {
        driver.gender = gender;
    }
    if let Some(start_city) = payload.start_city {
        driver.start_city = start_city;
    }
    if payload.start_lat.is_some() || payload.start_lon.is_some() {
        let stored = driver.home.unwrap_or(GeoPoint::new(0.0, 0.0));
        driver.home = optional_home(
            payload.start_lat.unwrap_or(stored.lat),
            payload.start_lon.unwrap_or(stored.lon),
        )?;
    }
    if let Some(paid) = payload.paid {
        driver.paid = paid;
    }
    driver.updated_at = Utc::now();

    info!(driver_id = telegram_id, "driver profile updated");
    Ok(Json(state.store.upsert_driver(driver)))
}

async fn list_driver_requests(
    State(state): State<Arc<AppState>>,
    Path(telegram_id): Path<i64>,
) -> Result<Json<Vec<DriverRequest>>, AppError> {
    Ok(Json(state.store.active_offers(telegram_id)?))
}

async fn create_driver_request(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateDriverRequestPayload>,
) -> Result<Json<DriverRequest>, AppError> {
    let now = Utc::now();
    let request = DriverRequest {
        id: Uuid::new_v4(),
        driver_id: payload.telegram_id,
        from_address: payload.from_address,
        to_address: payload.to_address,
        origin: checked_point(payload.from_lat, payload.from_lon)?,
        destination: checked_point(payload.to_lat, payload.to_lon)?,
        price: payload.price,
        comment: payload.comment,
        departure_time: payload.departure_time,
        status: RequestStatus::Active,
        created_at: now,
        updated_at: now,
    };

    state.store.insert_driver_request(request.clone());
    info!(request_id = %request.id, driver_id = request.driver_id, "driver request created");

    Ok(Json(request))
}

async fn update_driver_request_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<DriverRequest>, AppError> {
    state
        .store
        .set_driver_request_status(id, payload.status)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("driver request {id} not found")))
}
