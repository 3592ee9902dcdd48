use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::api::rest::checked_point;
use crate::api::rest::drivers::UpdateStatusRequest;
use crate::engine::queue::enqueue_notification;
use crate::error::AppError;
use crate::models::RequestStatus;
use crate::models::client::ClientRequest;
use crate::state::AppState;
use crate::store::CandidateSource;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/client-requests",
            post(create_client_request).get(list_active_requests),
        )
        .route("/client-requests/:id/status", patch(update_client_request_status))
        .route("/clients/:telegram_id", get(check_client))
        .route("/clients/:telegram_id/requests", get(list_client_requests))
}

#[derive(Deserialize)]
pub struct CreateClientRequestPayload {
    pub telegram_id: i64,
    pub from_address: String,
    pub to_address: String,
    pub from_lat: f64,
    pub from_lon: f64,
    pub to_lat: f64,
    pub to_lon: f64,
    #[serde(default)]
    pub price: i64,
    pub truck_type: String,
    #[serde(default)]
    pub comment: String,
    pub contact: String,
    pub photo_path: Option<String>,
}

#[derive(Serialize)]
struct ClientCheckResponse {
    exists: bool,
    offerta_accepted: bool,
}

/// Stores the request and queues the driver fan-out; the response does not
/// wait for any notification to go out.
async fn create_client_request(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateClientRequestPayload>,
) -> Result<Json<ClientRequest>, AppError> {
    if payload.contact.trim().is_empty() {
        return Err(AppError::BadRequest("contact cannot be empty".to_string()));
    }

    let origin = checked_point(payload.from_lat, payload.from_lon)?;
    let destination = checked_point(payload.to_lat, payload.to_lon)?;

    state.store.ensure_client(payload.telegram_id, &payload.contact);

    let now = Utc::now();
    let request = ClientRequest {
        id: Uuid::new_v4(),
        client_id: payload.telegram_id,
        from_address: payload.from_address,
        to_address: payload.to_address,
        origin,
        destination,
        price: payload.price,
        truck_type: payload.truck_type,
        comment: payload.comment,
        contact: payload.contact,
        photo_path: payload.photo_path,
        status: RequestStatus::Active,
        created_at: now,
        updated_at: now,
    };

    state.store.insert_client_request(request.clone());
    info!(request_id = %request.id, client_id = request.client_id, "client request created");

    enqueue_notification(&state, request.clone());

    Ok(Json(request))
}

async fn list_active_requests(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ClientRequest>>, AppError> {
    let requests: Vec<ClientRequest> = state.store.all_active()?;
    Ok(Json(requests))
}

async fn update_client_request_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<ClientRequest>, AppError> {
    state
        .store
        .set_client_request_status(id, payload.status)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("client request {id} not found")))
}

async fn check_client(
    State(state): State<Arc<AppState>>,
    Path(telegram_id): Path<i64>,
) -> Json<ClientCheckResponse> {
    let client = state.store.find_client(telegram_id);
    Json(ClientCheckResponse {
        exists: client.is_some(),
        offerta_accepted: client.is_some_and(|c| c.offerta_accepted),
    })
}

async fn list_client_requests(
    State(state): State<Arc<AppState>>,
    Path(telegram_id): Path<i64>,
) -> Json<Vec<ClientRequest>> {
    Json(state.store.client_requests_by_client(telegram_id))
}
