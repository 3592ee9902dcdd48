use tracing::{debug, warn};

use crate::geo::bbox::BoundingBox;
use crate::geo::{GeoPoint, haversine_km};
use crate::search::{Located, RESULT_LIMIT};
use crate::store::{CandidateSource, StoreError};

/// Candidates within `radius_km` of `center`, nearest first, capped at
/// [`RESULT_LIMIT`].
///
/// Tries the indexed path first. When it errors or finds nothing, the
/// brute-force path scans every eligible record instead. Only a fault on the
/// brute-force path reaches the caller.
pub fn find_near<T, S>(
    source: &S,
    center: &GeoPoint,
    radius_km: f64,
) -> Result<Vec<T>, StoreError>
where
    T: Located,
    S: CandidateSource<T> + ?Sized,
{
    let mut found = find_all_near(source, center, radius_km)?;
    found.truncate(RESULT_LIMIT);
    Ok(found)
}

/// Same as [`find_near`] without the result cap, for callers that must reach
/// every match rather than render a list.
pub fn find_all_near<T, S>(
    source: &S,
    center: &GeoPoint,
    radius_km: f64,
) -> Result<Vec<T>, StoreError>
where
    T: Located,
    S: CandidateSource<T> + ?Sized,
{
    match indexed_path(source, center, radius_km) {
        Ok(found) if !found.is_empty() => return Ok(found),
        Ok(_) => debug!(
            lat = center.lat,
            lon = center.lon,
            radius_km,
            "indexed proximity query empty; scanning all active"
        ),
        Err(err) => warn!(
            error = %err,
            lat = center.lat,
            lon = center.lon,
            radius_km,
            "indexed proximity query failed; scanning all active"
        ),
    }

    brute_force_path(source, center, radius_km)
}

/// Bounding-box prefilter in the store, exact filter here. Uncapped.
pub fn indexed_path<T, S>(
    source: &S,
    center: &GeoPoint,
    radius_km: f64,
) -> Result<Vec<T>, StoreError>
where
    T: Located,
    S: CandidateSource<T> + ?Sized,
{
    let bbox = BoundingBox::around(center, radius_km);
    let pool = source.within_box(&bbox)?;
    Ok(rank_all_within(pool, center, radius_km))
}

pub fn brute_force_path<T, S>(
    source: &S,
    center: &GeoPoint,
    radius_km: f64,
) -> Result<Vec<T>, StoreError>
where
    T: Located,
    S: CandidateSource<T> + ?Sized,
{
    let pool = source.all_active()?;
    Ok(rank_all_within(pool, center, radius_km))
}

/// [`rank_all_within`] capped at [`RESULT_LIMIT`].
pub fn rank_within<T: Located>(pool: Vec<T>, center: &GeoPoint, radius_km: f64) -> Vec<T> {
    let mut ranked = rank_all_within(pool, center, radius_km);
    ranked.truncate(RESULT_LIMIT);
    ranked
}

/// Keeps candidates at most `radius_km` away, sorted by distance with ties
/// going to the newest record.
pub fn rank_all_within<T: Located>(pool: Vec<T>, center: &GeoPoint, radius_km: f64) -> Vec<T> {
    let mut ranked: Vec<(f64, T)> = pool
        .into_iter()
        .filter_map(|candidate| {
            let point = candidate.location()?;
            let distance = haversine_km(center, &point);
            (distance <= radius_km).then_some((distance, candidate))
        })
        .collect();

    ranked.sort_by(|(a_km, a), (b_km, b)| {
        a_km.total_cmp(b_km)
            .then_with(|| b.created_at().cmp(&a.created_at()))
    });

    ranked.into_iter().map(|(_, candidate)| candidate).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{DateTime, Duration, Utc};

    use super::{brute_force_path, find_all_near, find_near, indexed_path, rank_within};
    use crate::geo::bbox::BoundingBox;
    use crate::geo::{GeoPoint, haversine_km};
    use crate::search::{Located, RESULT_LIMIT};
    use crate::store::{CandidateSource, StoreError};

    const ALMATY: GeoPoint = GeoPoint {
        lat: 43.2220,
        lon: 76.8512,
    };

    #[derive(Debug, Clone)]
    struct Spot {
        name: &'static str,
        point: Option<GeoPoint>,
        created_at: DateTime<Utc>,
    }

    impl Located for Spot {
        fn location(&self) -> Option<GeoPoint> {
            self.point
        }

        fn created_at(&self) -> DateTime<Utc> {
            self.created_at
        }
    }

    fn spot(name: &'static str, lat: f64, lon: f64, minutes_ago: i64) -> Spot {
        Spot {
            name,
            point: Some(GeoPoint::new(lat, lon)),
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    enum BoxBehaviour {
        Honest,
        Empty,
        Fails,
    }

    struct FakeSource {
        spots: Vec<Spot>,
        boxed: BoxBehaviour,
        scan_fails: bool,
        scans: AtomicUsize,
    }

    impl FakeSource {
        fn new(spots: Vec<Spot>, boxed: BoxBehaviour) -> Self {
            Self {
                spots,
                boxed,
                scan_fails: false,
                scans: AtomicUsize::new(0),
            }
        }
    }

    impl CandidateSource<Spot> for FakeSource {
        fn within_box(&self, bbox: &BoundingBox) -> Result<Vec<Spot>, StoreError> {
            match self.boxed {
                BoxBehaviour::Honest => Ok(self
                    .spots
                    .iter()
                    .filter(|s| s.point.is_some_and(|p| bbox.contains(&p)))
                    .cloned()
                    .collect()),
                BoxBehaviour::Empty => Ok(Vec::new()),
                BoxBehaviour::Fails => Err(StoreError::Query("no such index".to_string())),
            }
        }

        fn all_active(&self) -> Result<Vec<Spot>, StoreError> {
            self.scans.fetch_add(1, Ordering::SeqCst);
            if self.scan_fails {
                return Err(StoreError::Unavailable("connection reset".to_string()));
            }
            Ok(self.spots.clone())
        }
    }

    fn names(spots: &[Spot]) -> Vec<&'static str> {
        spots.iter().map(|s| s.name).collect()
    }

    #[test]
    fn keeps_points_inside_radius_only() {
        let source = FakeSource::new(
            vec![spot("a", 43.2500, 76.9000, 1), spot("b", 43.6000, 77.4000, 1)],
            BoxBehaviour::Honest,
        );

        let found = find_near(&source, &ALMATY, 10.0).unwrap();
        assert_eq!(names(&found), vec!["a"]);
    }

    #[test]
    fn radius_boundary_is_inclusive() {
        let edge = spot("edge", 43.2400, 76.8700, 1);
        let exact = haversine_km(&ALMATY, &edge.point.unwrap());
        let source = FakeSource::new(vec![edge], BoxBehaviour::Honest);

        let found = find_near(&source, &ALMATY, exact).unwrap();
        assert_eq!(names(&found), vec!["edge"]);
    }

    #[test]
    fn sorted_by_distance_then_newest() {
        let source = FakeSource::new(
            vec![
                spot("far", 43.2800, 76.8512, 1),
                spot("near-old", 43.2400, 76.8512, 30),
                spot("near-new", 43.2400, 76.8512, 2),
                spot("mid", 43.2500, 76.8512, 5),
            ],
            BoxBehaviour::Honest,
        );

        let found = find_near(&source, &ALMATY, 20.0).unwrap();
        assert_eq!(names(&found), vec!["near-new", "near-old", "mid", "far"]);
    }

    #[test]
    fn never_returns_more_than_the_limit() {
        let spots = (0..120)
            .map(|i| spot("crowd", 43.2220 + i as f64 * 0.0001, 76.8512, i))
            .collect();
        let source = FakeSource::new(spots, BoxBehaviour::Honest);

        let found = find_near(&source, &ALMATY, 50.0).unwrap();
        assert_eq!(found.len(), RESULT_LIMIT);
    }

    #[test]
    fn uncapped_search_keeps_every_match() {
        let spots = (0..120)
            .map(|i| spot("crowd", 43.2220 + i as f64 * 0.0001, 76.8512, i))
            .collect();
        let source = FakeSource::new(spots, BoxBehaviour::Empty);

        let found = find_all_near(&source, &ALMATY, 50.0).unwrap();
        assert_eq!(found.len(), 120);
        assert_eq!(source.scans.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn records_without_location_are_skipped() {
        let mut homeless = spot("homeless", 0.0, 0.0, 1);
        homeless.point = None;
        let found = rank_within(vec![homeless, spot("a", 43.23, 76.85, 1)], &ALMATY, 10.0);
        assert_eq!(names(&found), vec!["a"]);
    }

    #[test]
    fn falls_back_to_scan_when_index_fails() {
        let source = FakeSource::new(vec![spot("a", 43.2500, 76.9000, 1)], BoxBehaviour::Fails);

        assert!(indexed_path(&source, &ALMATY, 10.0).is_err());
        let found = find_near(&source, &ALMATY, 10.0).unwrap();
        assert_eq!(names(&found), vec!["a"]);
        assert_eq!(source.scans.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn falls_back_to_scan_when_index_is_empty() {
        let source = FakeSource::new(
            vec![spot("a", 43.2500, 76.9000, 1), spot("b", 43.6000, 77.4000, 1)],
            BoxBehaviour::Empty,
        );

        let found = find_near(&source, &ALMATY, 10.0).unwrap();
        assert_eq!(names(&found), vec!["a"]);
        assert_eq!(source.scans.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn indexed_hit_skips_the_scan() {
        let source = FakeSource::new(vec![spot("a", 43.2500, 76.9000, 1)], BoxBehaviour::Honest);

        find_near(&source, &ALMATY, 10.0).unwrap();
        assert_eq!(source.scans.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn nothing_nearby_is_an_empty_result() {
        let source = FakeSource::new(vec![spot("b", 43.6000, 77.4000, 1)], BoxBehaviour::Honest);

        let found = find_near(&source, &ALMATY, 10.0).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn fault_surfaces_when_no_path_works() {
        let mut source = FakeSource::new(vec![spot("a", 43.25, 76.90, 1)], BoxBehaviour::Fails);
        source.scan_fails = true;

        let result = find_near(&source, &ALMATY, 10.0);
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert!(brute_force_path(&source, &ALMATY, 10.0).is_err());
    }
}
