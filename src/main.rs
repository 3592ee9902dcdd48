use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use zholda_matcher::api;
use zholda_matcher::config::Config;
use zholda_matcher::engine::notify::run_notification_worker;
use zholda_matcher::error::AppError;
use zholda_matcher::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let (app_state, notify_rx) = AppState::new(config.notify_queue_size, config.event_buffer_size);
    let shared_state = Arc::new(app_state);

    let app = api::rest::router(shared_state.clone());

    let worker = tokio::spawn(run_notification_worker(shared_state.clone(), notify_rx));

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")));

    // Pending fan-outs are dropped on shutdown.
    worker.abort();
    tracing::info!("notification worker aborted");

    served
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
