pub mod memory;

use thiserror::Error;

use crate::geo::bbox::BoundingBox;
use crate::models::driver::{Driver, DriverRequest};

pub use memory::MemoryStore;

/// Data-access fault. An empty result is never one of these.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),
}

/// Read contracts the matching engine needs from a pool of candidates of one
/// kind. "Eligible" means `status = active` for requests and `paid` for
/// drivers.
pub trait CandidateSource<T> {
    /// Index-friendly path: eligible records whose location lies inside `bbox`.
    fn within_box(&self, bbox: &BoundingBox) -> Result<Vec<T>, StoreError>;

    /// Every eligible record, newest first.
    fn all_active(&self) -> Result<Vec<T>, StoreError>;
}

/// Identity lookups on drivers.
pub trait DriverDirectory {
    fn driver(&self, telegram_id: i64) -> Result<Option<Driver>, StoreError>;

    /// The driver's active route offers, newest first.
    fn active_offers(&self, telegram_id: i64) -> Result<Vec<DriverRequest>, StoreError>;
}
