use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::engine::dispatcher::MessageDispatcher;
use crate::models::client::ClientRequest;
use crate::models::driver::Driver;
use crate::search::proximity::find_all_near;
use crate::state::AppState;
use crate::store::CandidateSource;

pub const NOTIFY_RADIUS_KM: f64 = 15.0;

/// Delivery tally for one fan-out. Informational only; failures have already
/// been logged and absorbed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FanOutReport {
    pub matched: usize,
    pub delivered: usize,
    pub failed: usize,
}

pub async fn run_notification_worker(
    state: Arc<AppState>,
    mut notify_rx: mpsc::Receiver<ClientRequest>,
) {
    info!("notification worker started");

    while let Some(request) = notify_rx.recv().await {
        state.metrics.notification_queue_depth.dec();

        let start = Instant::now();
        let report =
            notify_nearby_drivers(&state.store, state.dispatcher.as_ref(), &request).await;

        state
            .metrics
            .fanout_latency_seconds
            .observe(start.elapsed().as_secs_f64());
        state
            .metrics
            .notifications_total
            .with_label_values(&["delivered"])
            .inc_by(report.delivered as u64);
        state
            .metrics
            .notifications_total
            .with_label_values(&["failed"])
            .inc_by(report.failed as u64);
    }

    warn!("notification worker stopped: queue channel closed");
}

/// Messages every eligible driver based within [`NOTIFY_RADIUS_KM`] of the
/// request's pickup point. Each delivery stands alone: a failed recipient is
/// logged and skipped. Every match is messaged; the list-size cap of the
/// search endpoints does not apply here.
pub async fn notify_nearby_drivers<S, M>(
    drivers: &S,
    dispatcher: &M,
    request: &ClientRequest,
) -> FanOutReport
where
    S: CandidateSource<Driver> + ?Sized,
    M: MessageDispatcher + ?Sized,
{
    let recipients: Vec<Driver> = match find_all_near(drivers, &request.origin, NOTIFY_RADIUS_KM) {
        Ok(found) => found,
        Err(err) => {
            error!(error = %err, request_id = %request.id, "failed to look up nearby drivers");
            return FanOutReport::default();
        }
    };

    let text = compose_message(request);
    let mut report = FanOutReport {
        matched: recipients.len(),
        ..FanOutReport::default()
    };

    for driver in &recipients {
        match dispatcher.send(driver.telegram_id, &text).await {
            Ok(()) => report.delivered += 1,
            Err(err) => {
                report.failed += 1;
                warn!(driver_id = driver.telegram_id, error = %err, "failed to notify driver");
            }
        }
    }

    info!(
        request_id = %request.id,
        matched = report.matched,
        delivered = report.delivered,
        failed = report.failed,
        "nearby drivers notified"
    );

    report
}

const REGISTRATION_CONFIRMATION: &str = "✅ Congratulations! You are registered as a driver.\n\n\
     You can now post route offers and take orders from clients.";

/// Tells a freshly registered driver they are in. Failure is logged and
/// reported as `false`; the registration itself is never affected.
pub async fn confirm_registration<M>(dispatcher: &M, telegram_id: i64) -> bool
where
    M: MessageDispatcher + ?Sized,
{
    match dispatcher.send(telegram_id, REGISTRATION_CONFIRMATION).await {
        Ok(()) => true,
        Err(err) => {
            warn!(
                driver_id = telegram_id,
                error = %err,
                "failed to send registration confirmation"
            );
            false
        }
    }
}

/// Sends the registration confirmation on a detached task so the caller does
/// not wait on the messaging gateway.
pub fn spawn_registration_confirmation(state: &AppState, telegram_id: i64) -> JoinHandle<bool> {
    let dispatcher = Arc::clone(&state.dispatcher);
    tokio::spawn(async move { confirm_registration(dispatcher.as_ref(), telegram_id).await })
}

fn truck_emoji(truck_type: &str) -> &'static str {
    match truck_type {
        "small" => "🚐",
        "large" => "🚛",
        "refrigerator" => "❄️",
        "tow" => "🚗",
        _ => "🚚",
    }
}

pub fn compose_message(request: &ClientRequest) -> String {
    let mut text = format!(
        "🆕 New order!\n\n\
         📍 From: {}\n\
         🎯 To: {}\n\
         💰 Price: {} ₸\n\
         {} Truck type: {}\n",
        request.from_address,
        request.to_address,
        request.price,
        truck_emoji(&request.truck_type),
        request.truck_type,
    );

    if !request.comment.is_empty() {
        text.push_str(&format!("💬 Comment: {}\n", request.comment));
    }

    text.push_str(&format!("\n📱 Contact: {}", request.contact));
    text
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;
    use futures::FutureExt;
    use futures::future::BoxFuture;
    use uuid::Uuid;

    use super::{FanOutReport, compose_message, confirm_registration, notify_nearby_drivers};
    use crate::engine::dispatcher::{DispatchError, MessageDispatcher};
    use crate::geo::GeoPoint;
    use crate::geo::bbox::BoundingBox;
    use crate::models::RequestStatus;
    use crate::models::client::ClientRequest;
    use crate::models::driver::Driver;
    use crate::store::{CandidateSource, MemoryStore, StoreError};

    #[derive(Default)]
    struct RecordingDispatcher {
        failing: Vec<i64>,
        delivered: Mutex<Vec<i64>>,
    }

    impl MessageDispatcher for RecordingDispatcher {
        fn send<'a>(
            &'a self,
            recipient_id: i64,
            _text: &'a str,
        ) -> BoxFuture<'a, Result<(), DispatchError>> {
            async move {
                if self.failing.contains(&recipient_id) {
                    return Err(DispatchError::Rejected {
                        recipient_id,
                        reason: "bot was blocked by the user".to_string(),
                    });
                }
                self.delivered.lock().unwrap().push(recipient_id);
                Ok(())
            }
            .boxed()
        }
    }

    fn driver(telegram_id: i64, lat: f64, lon: f64, paid: bool) -> Driver {
        Driver {
            telegram_id,
            full_name: "Driver".to_string(),
            contact: "+77010000000".to_string(),
            gender: "male".to_string(),
            start_city: "Almaty".to_string(),
            home: Some(GeoPoint::new(lat, lon)),
            paid,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn request(comment: &str) -> ClientRequest {
        ClientRequest {
            id: Uuid::new_v4(),
            client_id: 9,
            from_address: "Almaty, Abay 10".to_string(),
            to_address: "Astana".to_string(),
            origin: GeoPoint::new(43.2220, 76.8512),
            destination: GeoPoint::new(51.1694, 71.4491),
            price: 120_000,
            truck_type: "refrigerator".to_string(),
            comment: comment.to_string(),
            contact: "+77075553311".to_string(),
            photo_path: None,
            status: RequestStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn one_failed_recipient_does_not_stop_the_rest() {
        let store = MemoryStore::new();
        store.upsert_driver(driver(1, 43.2300, 76.8600, true));
        store.upsert_driver(driver(2, 43.2400, 76.8700, true));
        store.upsert_driver(driver(3, 43.2600, 76.9000, true));
        let dispatcher = RecordingDispatcher {
            failing: vec![2],
            ..RecordingDispatcher::default()
        };

        let report = notify_nearby_drivers(&store, &dispatcher, &request("")).await;

        assert_eq!(
            report,
            FanOutReport {
                matched: 3,
                delivered: 2,
                failed: 1
            }
        );
        assert_eq!(*dispatcher.delivered.lock().unwrap(), vec![1, 3]);
    }

    #[tokio::test]
    async fn skips_unpaid_and_distant_drivers() {
        let store = MemoryStore::new();
        store.upsert_driver(driver(1, 43.2300, 76.8600, false));
        store.upsert_driver(driver(2, 43.6000, 77.4000, true));
        store.upsert_driver(driver(3, 43.2300, 76.8600, true));
        let dispatcher = RecordingDispatcher::default();

        let report = notify_nearby_drivers(&store, &dispatcher, &request("")).await;

        assert_eq!(report.matched, 1);
        assert_eq!(*dispatcher.delivered.lock().unwrap(), vec![3]);
    }

    #[tokio::test]
    async fn every_driver_in_range_is_notified_past_the_list_cap() {
        let store = MemoryStore::new();
        for i in 0..60 {
            store.upsert_driver(driver(1_000 + i, 43.2220 + i as f64 * 0.0005, 76.8512, true));
        }
        let dispatcher = RecordingDispatcher::default();

        let report = notify_nearby_drivers(&store, &dispatcher, &request("")).await;

        assert_eq!(report.matched, 60);
        assert_eq!(report.delivered, 60);
        assert_eq!(dispatcher.delivered.lock().unwrap().len(), 60);
    }

    #[tokio::test]
    async fn registration_confirmation_reaches_the_driver() {
        let dispatcher = RecordingDispatcher::default();

        assert!(confirm_registration(&dispatcher, 31).await);
        assert_eq!(*dispatcher.delivered.lock().unwrap(), vec![31]);
    }

    #[tokio::test]
    async fn registration_confirmation_failure_is_absorbed() {
        let dispatcher = RecordingDispatcher {
            failing: vec![31],
            ..RecordingDispatcher::default()
        };

        assert!(!confirm_registration(&dispatcher, 31).await);
        assert!(dispatcher.delivered.lock().unwrap().is_empty());
    }

    struct OfflineStore;

    impl CandidateSource<Driver> for OfflineStore {
        fn within_box(&self, _bbox: &BoundingBox) -> Result<Vec<Driver>, StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }

        fn all_active(&self) -> Result<Vec<Driver>, StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }
    }

    #[tokio::test]
    async fn lookup_fault_sends_nothing() {
        let dispatcher = RecordingDispatcher::default();

        let report = notify_nearby_drivers(&OfflineStore, &dispatcher, &request("")).await;

        assert_eq!(report, FanOutReport::default());
        assert!(dispatcher.delivered.lock().unwrap().is_empty());
    }

    #[test]
    fn message_lists_route_price_and_contact() {
        let text = compose_message(&request("fragile, 2 boxes"));

        assert!(text.contains("From: Almaty, Abay 10"));
        assert!(text.contains("To: Astana"));
        assert!(text.contains("120000 ₸"));
        assert!(text.contains("❄️ Truck type: refrigerator"));
        assert!(text.contains("Comment: fragile, 2 boxes"));
        assert!(text.ends_with("Contact: +77075553311"));
    }

    #[test]
    fn message_omits_empty_comment() {
        let text = compose_message(&request(""));
        assert!(!text.contains("Comment"));
    }
}
