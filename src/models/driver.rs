use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::models::RequestStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub telegram_id: i64,
    pub full_name: String,
    pub contact: String,
    pub gender: String,
    pub start_city: String,
    /// Registered home location; `None` when the driver never shared one.
    pub home: Option<GeoPoint>,
    /// Eligibility for location-based matching.
    pub paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A route offer posted by a driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverRequest {
    pub id: Uuid,
    /// Telegram id of the owning driver. Logical reference only: the store
    /// does not check that the driver is registered.
    pub driver_id: i64,
    pub from_address: String,
    pub to_address: String,
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    pub price: i64,
    pub comment: String,
    pub departure_time: Option<DateTime<Utc>>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A driver paired with the offer shown to clients.
#[derive(Debug, Clone, Serialize)]
pub struct DriverOffer {
    pub driver: Driver,
    pub offer: DriverRequest,
}
