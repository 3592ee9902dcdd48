pub mod bbox;

use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// WGS-84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Converts raw coordinates from the web app into an optional location.
    ///
    /// The app sends `0` for a coordinate it could not obtain, so a point with
    /// either coordinate at exactly zero is treated as absent. This also
    /// discards genuine equator/prime-meridian positions.
    pub fn from_raw(lat: f64, lon: f64) -> Option<Self> {
        if lat == 0.0 || lon == 0.0 {
            None
        } else {
            Some(Self { lat, lon })
        }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Great-circle distance in kilometers on a spherical Earth.
///
/// Inputs are not range-checked; NaN coordinates yield a NaN distance, which
/// never compares `<=` to a radius and so never matches.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lon = (delta_lon / 2.0).sin();

    let haversine = sin_lat * sin_lat + phi1.cos() * phi2.cos() * sin_lon * sin_lon;
    let central_angle = 2.0 * haversine.sqrt().atan2((1.0 - haversine).sqrt());

    EARTH_RADIUS_KM * central_angle
}

pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    distance_km(a.lat, a.lon, b.lat, b.lon)
}

#[cfg(test)]
mod tests {
    use super::{GeoPoint, distance_km, haversine_km};

    const ALMATY: GeoPoint = GeoPoint {
        lat: 43.2220,
        lon: 76.8512,
    };

    #[test]
    fn zero_distance_for_same_point() {
        assert!(haversine_km(&ALMATY, &ALMATY) < 1e-9);
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [
            (43.2220, 76.8512, 51.1694, 71.4491),
            (-33.8688, 151.2093, 40.7128, -74.0060),
            (0.5, -179.9, -0.5, 179.9),
        ];

        for (lat1, lon1, lat2, lon2) in pairs {
            let there = distance_km(lat1, lon1, lat2, lon2);
            let back = distance_km(lat2, lon2, lat1, lon1);
            assert!((there - back).abs() < 1e-9, "{there} != {back}");
        }
    }

    #[test]
    fn london_to_paris_is_around_343_km() {
        let london = GeoPoint::new(51.5074, -0.1278);
        let paris = GeoPoint::new(48.8566, 2.3522);
        let distance = haversine_km(&london, &paris);
        assert!((distance - 343.5).abs() < 2.0);
    }

    #[test]
    fn almaty_neighbourhood_distances() {
        let near = GeoPoint::new(43.2500, 76.9000);
        let far = GeoPoint::new(43.6000, 77.4000);

        let near_km = haversine_km(&ALMATY, &near);
        let far_km = haversine_km(&ALMATY, &far);

        assert!(near_km > 4.0 && near_km < 6.0, "near = {near_km}");
        assert!(far_km > 50.0 && far_km < 70.0, "far = {far_km}");
    }

    #[test]
    fn nan_input_yields_nan_distance() {
        assert!(distance_km(f64::NAN, 0.0, 1.0, 1.0).is_nan());
    }

    #[test]
    fn zero_coordinates_are_treated_as_absent() {
        assert_eq!(GeoPoint::from_raw(0.0, 0.0), None);
        assert_eq!(GeoPoint::from_raw(43.2220, 0.0), None);
        assert_eq!(GeoPoint::from_raw(0.0, 76.8512), None);
        assert_eq!(GeoPoint::from_raw(43.2220, 76.8512), Some(ALMATY));
    }

    #[test]
    fn range_check() {
        assert!(ALMATY.is_valid());
        assert!(!GeoPoint::new(91.0, 10.0).is_valid());
        assert!(!GeoPoint::new(10.0, -180.5).is_valid());
    }
}
