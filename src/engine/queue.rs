use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;

use crate::models::client::ClientRequest;
use crate::state::AppState;

/// Hands a freshly stored request to the notification worker without waiting.
/// A full or closed queue drops the fan-out for this request; the write that
/// triggered it has already succeeded.
pub fn enqueue_notification(state: &AppState, request: ClientRequest) {
    match state.notify_tx.try_send(request) {
        Ok(()) => state.metrics.notification_queue_depth.inc(),
        Err(TrySendError::Full(request)) => {
            warn!(request_id = %request.id, "notification queue full; skipping fan-out");
        }
        Err(TrySendError::Closed(request)) => {
            warn!(request_id = %request.id, "notification worker stopped; skipping fan-out");
        }
    }
}
