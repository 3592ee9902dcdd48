pub mod client;
pub mod driver;

use serde::{Deserialize, Serialize};

/// Lifecycle of a posted request. Only `Active` records take part in matching;
/// records are retired by status change and never deleted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Active,
    Completed,
    Cancelled,
}
