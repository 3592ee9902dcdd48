use tracing::debug;

use crate::geo::GeoPoint;
use crate::models::driver::{Driver, DriverOffer};
use crate::search::proximity::find_near;
use crate::store::{CandidateSource, DriverDirectory, StoreError};

pub const OFFER_MATCH_RADIUS_KM: f64 = 10.0;

/// Paid drivers based near `pickup`, each with their most recent active offer.
/// Drivers with no active offer are left out. Only the pickup point is
/// considered; the drop-off does not narrow the match.
pub fn offers_near<S>(store: &S, pickup: &GeoPoint) -> Result<Vec<DriverOffer>, StoreError>
where
    S: CandidateSource<Driver> + DriverDirectory + ?Sized,
{
    let drivers: Vec<Driver> = find_near(store, pickup, OFFER_MATCH_RADIUS_KM)?;
    let mut offers = Vec::with_capacity(drivers.len());

    for driver in drivers {
        match store.active_offers(driver.telegram_id)?.into_iter().next() {
            Some(offer) => offers.push(DriverOffer { driver, offer }),
            None => debug!(driver_id = driver.telegram_id, "nearby driver has no active offer"),
        }
    }

    Ok(offers)
}
