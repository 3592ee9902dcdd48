use std::hash::Hash;

use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::geo::bbox::BoundingBox;
use crate::models::RequestStatus;
use crate::models::client::{Client, ClientRequest};
use crate::models::driver::{Driver, DriverOffer, DriverRequest};
use crate::search::Located;
use crate::store::{CandidateSource, DriverDirectory, StoreError};

/// In-process record store. Each map operation is atomic on its own; nothing
/// here needs a multi-record transaction.
#[derive(Default)]
pub struct MemoryStore {
    drivers: DashMap<i64, Driver>,
    clients: DashMap<i64, Client>,
    driver_requests: DashMap<Uuid, DriverRequest>,
    client_requests: DashMap<Uuid, ClientRequest>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a driver by telegram id, keeping the original
    /// registration time.
    pub fn upsert_driver(&self, driver: Driver) -> Driver {
        self.drivers
            .entry(driver.telegram_id)
            .and_modify(|existing| {
                let created_at = existing.created_at;
                *existing = Driver {
                    created_at,
                    ..driver.clone()
                };
            })
            .or_insert_with(|| driver.clone())
            .value()
            .clone()
    }

    pub fn find_driver(&self, telegram_id: i64) -> Option<Driver> {
        self.drivers.get(&telegram_id).map(|entry| entry.value().clone())
    }

    pub fn insert_driver_request(&self, request: DriverRequest) {
        self.driver_requests.insert(request.id, request);
    }

    pub fn set_driver_request_status(
        &self,
        id: Uuid,
        status: RequestStatus,
    ) -> Option<DriverRequest> {
        let mut request = self.driver_requests.get_mut(&id)?;
        request.status = status;
        request.updated_at = Utc::now();
        Some(request.value().clone())
    }

    /// Returns the existing client, registering a new one on first contact.
    pub fn ensure_client(&self, telegram_id: i64, contact: &str) -> Client {
        self.clients
            .entry(telegram_id)
            .or_insert_with(|| {
                let now = Utc::now();
                Client {
                    telegram_id,
                    contact: contact.to_string(),
                    offerta_accepted: true,
                    created_at: now,
                    updated_at: now,
                }
            })
            .value()
            .clone()
    }

    pub fn find_client(&self, telegram_id: i64) -> Option<Client> {
        self.clients.get(&telegram_id).map(|entry| entry.value().clone())
    }

    pub fn insert_client_request(&self, request: ClientRequest) {
        self.client_requests.insert(request.id, request);
    }

    pub fn set_client_request_status(
        &self,
        id: Uuid,
        status: RequestStatus,
    ) -> Option<ClientRequest> {
        let mut request = self.client_requests.get_mut(&id)?;
        request.status = status;
        request.updated_at = Utc::now();
        Some(request.value().clone())
    }

    /// All of a client's requests regardless of status, newest first.
    pub fn client_requests_by_client(&self, client_id: i64) -> Vec<ClientRequest> {
        let mut requests: Vec<ClientRequest> = self
            .client_requests
            .iter()
            .filter(|entry| entry.client_id == client_id)
            .map(|entry| entry.value().clone())
            .collect();
        newest_first(&mut requests);
        requests
    }

    /// Every active offer of a paid driver, newest offer first.
    pub fn offer_board(&self) -> Vec<DriverOffer> {
        let mut offers: Vec<DriverOffer> = self
            .driver_requests
            .iter()
            .filter(|entry| entry.status == RequestStatus::Active)
            .filter_map(|entry| {
                let driver = self.drivers.get(&entry.driver_id)?;
                driver.paid.then(|| DriverOffer {
                    driver: driver.value().clone(),
                    offer: entry.value().clone(),
                })
            })
            .collect();
        offers.sort_by(|a, b| b.offer.created_at.cmp(&a.offer.created_at));
        offers
    }

    pub fn driver_count(&self) -> usize {
        self.drivers.len()
    }

    pub fn driver_request_count(&self) -> usize {
        self.driver_requests.len()
    }

    pub fn client_request_count(&self) -> usize {
        self.client_requests.len()
    }
}

fn newest_first<T: Located>(items: &mut [T]) {
    items.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
}

fn eligible_in<K, T, F>(map: &DashMap<K, T>, keep: F) -> Vec<T>
where
    K: Eq + Hash,
    T: Located + Clone,
    F: Fn(&T) -> bool,
{
    let mut items: Vec<T> = map
        .iter()
        .filter(|entry| keep(entry.value()))
        .map(|entry| entry.value().clone())
        .collect();
    newest_first(&mut items);
    items
}

fn located_in<T: Located>(item: &T, bbox: &BoundingBox) -> bool {
    item.location().is_some_and(|point| bbox.contains(&point))
}

impl CandidateSource<ClientRequest> for MemoryStore {
    fn within_box(&self, bbox: &BoundingBox) -> Result<Vec<ClientRequest>, StoreError> {
        Ok(eligible_in(&self.client_requests, |request| {
            request.status == RequestStatus::Active && located_in(request, bbox)
        }))
    }

    fn all_active(&self) -> Result<Vec<ClientRequest>, StoreError> {
        Ok(eligible_in(&self.client_requests, |request| {
            request.status == RequestStatus::Active
        }))
    }
}

impl CandidateSource<DriverRequest> for MemoryStore {
    fn within_box(&self, bbox: &BoundingBox) -> Result<Vec<DriverRequest>, StoreError> {
        Ok(eligible_in(&self.driver_requests, |request| {
            request.status == RequestStatus::Active && located_in(request, bbox)
        }))
    }

    fn all_active(&self) -> Result<Vec<DriverRequest>, StoreError> {
        Ok(eligible_in(&self.driver_requests, |request| {
            request.status == RequestStatus::Active
        }))
    }
}

impl CandidateSource<Driver> for MemoryStore {
    fn within_box(&self, bbox: &BoundingBox) -> Result<Vec<Driver>, StoreError> {
        Ok(eligible_in(&self.drivers, |driver| {
            driver.paid && located_in(driver, bbox)
        }))
    }

    fn all_active(&self) -> Result<Vec<Driver>, StoreError> {
        Ok(eligible_in(&self.drivers, |driver| driver.paid))
    }
}

impl DriverDirectory for MemoryStore {
    fn driver(&self, telegram_id: i64) -> Result<Option<Driver>, StoreError> {
        Ok(self.find_driver(telegram_id))
    }

    fn active_offers(&self, telegram_id: i64) -> Result<Vec<DriverRequest>, StoreError> {
        Ok(eligible_in(&self.driver_requests, |request| {
            request.driver_id == telegram_id && request.status == RequestStatus::Active
        }))
    }
}
