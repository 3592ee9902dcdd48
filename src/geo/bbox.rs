use serde::Serialize;

use crate::geo::GeoPoint;

/// Rough length of one degree of latitude.
const KM_PER_DEGREE: f64 = 111.0;

/// Axis-aligned box approximating a radius around a center point.
///
/// Longitude delta grows as `1 / cos(lat)`, so near the poles the box widens
/// without bound (and is infinite at exactly ±90°). Terrestrial delivery
/// routes never get there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub center: GeoPoint,
    pub lat_delta: f64,
    pub lon_delta: f64,
}

impl BoundingBox {
    pub fn around(center: &GeoPoint, radius_km: f64) -> Self {
        let lat_delta = radius_km / KM_PER_DEGREE;
        let lon_delta = radius_km / (KM_PER_DEGREE * center.lat.to_radians().cos());

        Self {
            center: *center,
            lat_delta,
            lon_delta,
        }
    }

    pub fn min_lat(&self) -> f64 {
        self.center.lat - self.lat_delta
    }

    pub fn max_lat(&self) -> f64 {
        self.center.lat + self.lat_delta
    }

    pub fn min_lon(&self) -> f64 {
        self.center.lon - self.lon_delta
    }

    pub fn max_lon(&self) -> f64 {
        self.center.lon + self.lon_delta
    }

    /// Strict range test, same shape as `ABS(lat - ?) < ?` on an indexed column.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        (point.lat - self.center.lat).abs() < self.lat_delta
            && (point.lon - self.center.lon).abs() < self.lon_delta
    }
}
