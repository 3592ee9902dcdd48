use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::engine::dispatcher::{BroadcastDispatcher, MessageDispatcher, Notification};
use crate::models::client::ClientRequest;
use crate::observability::metrics::Metrics;
use crate::store::MemoryStore;

pub struct AppState {
    pub store: MemoryStore,
    pub dispatcher: Arc<dyn MessageDispatcher>,
    pub notify_tx: mpsc::Sender<ClientRequest>,
    pub notification_events_tx: broadcast::Sender<Notification>,
    pub metrics: Metrics,
}

impl AppState {
    /// State whose notifications go out to websocket-connected gateways.
    pub fn new(
        notify_queue_size: usize,
        event_buffer_size: usize,
    ) -> (Self, mpsc::Receiver<ClientRequest>) {
        let (notification_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);
        let dispatcher = Arc::new(BroadcastDispatcher::new(notification_events_tx.clone()));
        Self::build(notify_queue_size, notification_events_tx, dispatcher)
    }

    pub fn with_dispatcher(
        notify_queue_size: usize,
        dispatcher: Arc<dyn MessageDispatcher>,
    ) -> (Self, mpsc::Receiver<ClientRequest>) {
        let (notification_events_tx, _unused_rx) = broadcast::channel(1);
        Self::build(notify_queue_size, notification_events_tx, dispatcher)
    }

    fn build(
        notify_queue_size: usize,
        notification_events_tx: broadcast::Sender<Notification>,
        dispatcher: Arc<dyn MessageDispatcher>,
    ) -> (Self, mpsc::Receiver<ClientRequest>) {
        let (notify_tx, notify_rx) = mpsc::channel(notify_queue_size);

        (
            Self {
                store: MemoryStore::new(),
                dispatcher,
                notify_tx,
                notification_events_tx,
                metrics: Metrics::new(),
            },
            notify_rx,
        )
    }
}
