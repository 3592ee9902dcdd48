use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::models::RequestStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub telegram_id: i64,
    pub contact: String,
    pub offerta_accepted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A delivery need posted by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRequest {
    pub id: Uuid,
    /// Telegram id of the owning client, not a store key.
    pub client_id: i64,
    pub from_address: String,
    pub to_address: String,
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    pub price: i64,
    pub truck_type: String,
    pub comment: String,
    pub contact: String,
    pub photo_path: Option<String>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
