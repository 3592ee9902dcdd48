use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no delivery gateway connected")]
    NoGateway,

    #[error("recipient {recipient_id} rejected the message: {reason}")]
    Rejected { recipient_id: i64, reason: String },
}

/// Outbound chat messages, addressed by telegram id.
pub trait MessageDispatcher: Send + Sync {
    fn send<'a>(
        &'a self,
        recipient_id: i64,
        text: &'a str,
    ) -> BoxFuture<'a, Result<(), DispatchError>>;
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub recipient_id: i64,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

/// Publishes every message as a [`Notification`] to connected bot gateways.
#[derive(Clone)]
pub struct BroadcastDispatcher {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastDispatcher {
    pub fn new(tx: broadcast::Sender<Notification>) -> Self {
        Self { tx }
    }
}

impl MessageDispatcher for BroadcastDispatcher {
    fn send<'a>(
        &'a self,
        recipient_id: i64,
        text: &'a str,
    ) -> BoxFuture<'a, Result<(), DispatchError>> {
        async move {
            let notification = Notification {
                recipient_id,
                text: text.to_string(),
                sent_at: Utc::now(),
            };

            self.tx
                .send(notification)
                .map(|_| ())
                .map_err(|_| DispatchError::NoGateway)
        }
        .boxed()
    }
}
