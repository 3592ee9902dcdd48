//! Geospatial matching: proximity search with an indexed/brute-force strategy
//! pair, coarse route text matching, and the tiered search cascade used when
//! a driver browses client requests.

pub mod offers;
pub mod orchestrator;
pub mod proximity;
pub mod route;

use chrono::{DateTime, Utc};

use crate::geo::GeoPoint;
use crate::models::client::ClientRequest;
use crate::models::driver::{Driver, DriverRequest};

/// Upper bound on any ranked result list.
pub const RESULT_LIMIT: usize = 50;

/// A record that can be ranked by distance and recency.
pub trait Located {
    /// Matching point; `None` excludes the record from proximity results.
    fn location(&self) -> Option<GeoPoint>;

    fn created_at(&self) -> DateTime<Utc>;
}

/// A record with free-text endpoint addresses.
pub trait Routed: Located {
    fn from_address(&self) -> &str;

    fn to_address(&self) -> &str;
}

impl Located for Driver {
    fn location(&self) -> Option<GeoPoint> {
        self.home
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Located for ClientRequest {
    fn location(&self) -> Option<GeoPoint> {
        Some(self.origin)
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Routed for ClientRequest {
    fn from_address(&self) -> &str {
        &self.from_address
    }

    fn to_address(&self) -> &str {
        &self.to_address
    }
}

impl Located for DriverRequest {
    fn location(&self) -> Option<GeoPoint> {
        Some(self.origin)
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Routed for DriverRequest {
    fn from_address(&self) -> &str {
        &self.from_address
    }

    fn to_address(&self) -> &str {
        &self.to_address
    }
}
