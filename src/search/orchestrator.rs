use serde::Serialize;
use tracing::info;

use crate::geo::GeoPoint;
use crate::models::driver::Driver;
use crate::search::proximity::find_near;
use crate::search::route::find_by_route;
use crate::search::{RESULT_LIMIT, Routed};
use crate::store::{CandidateSource, DriverDirectory, StoreError};

pub const DEFAULT_SEARCH_RADIUS_KM: f64 = 50.0;

/// What the requester asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    Geolocation,
    Route,
    Unspecified,
}

impl SearchType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "geolocation" => Self::Geolocation,
            "route" => Self::Route,
            _ => Self::Unspecified,
        }
    }
}

/// Which tier actually produced the results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    Geolocation,
    Route,
    HomeLocation,
    AllActive,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Geolocation => "geolocation",
            Self::Route => "route",
            Self::HomeLocation => "home_location",
            Self::AllActive => "all_active",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub requester_id: i64,
    pub search_type: SearchType,
    /// Current position, already stripped of the zero sentinel.
    pub location: Option<GeoPoint>,
    pub radius_km: Option<f64>,
    pub from_city: Option<String>,
    pub to_city: Option<String>,
}

impl SearchQuery {
    /// Unset or non-positive radii fall back to the default.
    pub fn radius(&self) -> f64 {
        self.radius_km
            .filter(|radius| *radius > 0.0)
            .unwrap_or(DEFAULT_SEARCH_RADIUS_KM)
    }

    /// Both city names, when both are non-blank.
    pub fn route(&self) -> Option<(&str, &str)> {
        let from = self.from_city.as_deref().map(str::trim).unwrap_or_default();
        let to = self.to_city.as_deref().map(str::trim).unwrap_or_default();
        if from.is_empty() || to.is_empty() {
            None
        } else {
            Some((from, to))
        }
    }
}

#[derive(Debug)]
pub struct SearchOutcome<T> {
    pub results: Vec<T>,
    pub mode: SearchMode,
    pub requester: Option<Driver>,
}

enum Tier<'q> {
    Geolocation(GeoPoint),
    Route(&'q str, &'q str),
    HomeLocation(GeoPoint),
    AllActive,
}

impl Tier<'_> {
    fn mode(&self) -> SearchMode {
        match self {
            Self::Geolocation(_) => SearchMode::Geolocation,
            Self::Route(..) => SearchMode::Route,
            Self::HomeLocation(_) => SearchMode::HomeLocation,
            Self::AllActive => SearchMode::AllActive,
        }
    }
}

/// First tier whose preconditions hold. Tiers are chosen up front; a tier
/// that runs and finds nothing is not retried with the next one.
fn select_tier<'q>(query: &'q SearchQuery, requester: Option<&Driver>) -> Tier<'q> {
    match (query.search_type, query.location, query.route()) {
        (SearchType::Geolocation, Some(center), _) => return Tier::Geolocation(center),
        (SearchType::Route, _, Some((from, to))) => return Tier::Route(from, to),
        _ => {}
    }

    match requester.and_then(|driver| driver.home) {
        Some(home) => Tier::HomeLocation(home),
        None => Tier::AllActive,
    }
}

/// Runs the search cascade for a driver browsing candidates:
/// explicit geolocation, then route text, then the requester's registered
/// home, then every active candidate.
pub fn search<T, S, D>(
    source: &S,
    directory: &D,
    query: &SearchQuery,
) -> Result<SearchOutcome<T>, StoreError>
where
    T: Routed,
    S: CandidateSource<T> + ?Sized,
    D: DriverDirectory + ?Sized,
{
    let requester = directory.driver(query.requester_id)?;
    let tier = select_tier(query, requester.as_ref());
    let radius_km = query.radius();

    let results = match &tier {
        Tier::Geolocation(center) => {
            info!(lat = center.lat, lon = center.lon, radius_km, "searching by geolocation");
            find_near(source, center, radius_km)?
        }
        Tier::Route(from, to) => {
            info!(from = %from, to = %to, "searching by route");
            find_by_route(source, from, to)?
        }
        Tier::HomeLocation(home) => {
            info!(lat = home.lat, lon = home.lon, radius_km, "searching by driver start location");
            find_near(source, home, radius_km)?
        }
        Tier::AllActive => {
            info!("listing all active candidates");
            let mut all = source.all_active()?;
            all.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
            all.truncate(RESULT_LIMIT);
            all
        }
    };

    info!(
        requester_id = query.requester_id,
        mode = tier.mode().as_str(),
        count = results.len(),
        "search finished"
    );

    Ok(SearchOutcome {
        results,
        mode: tier.mode(),
        requester,
    })
}
