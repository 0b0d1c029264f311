//! HTTP server setup

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::options::ServerOptions;
use crate::errors::AgentError;
use crate::server::handlers::{health_handler, registry_handler, telegram_handler};
use crate::server::state::ServerState;

pub const REGISTRY_WEBHOOK_PATH: &str = "/registry/events";
pub const TELEGRAM_WEBHOOK_PATH: &str = "/telegram/updates";

/// Build the router. Unmatched paths fall through to axum's 404.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        // Health
        .route("/health", get(health_handler))
        // Webhooks
        .route(REGISTRY_WEBHOOK_PATH, post(registry_handler))
        .route(TELEGRAM_WEBHOOK_PATH, post(telegram_handler))
        // State and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server
pub async fn serve(
    options: &ServerOptions,
    state: Arc<ServerState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), AgentError>>, AgentError> {
    let app = router(state);

    let addr = format!("{}:{}", options.host, options.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AgentError::ServerError(format!("Failed to bind {}: {}", addr, e)))?;
    info!("Listening on {}", addr);

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| AgentError::ServerError(e.to_string()))
    });

    Ok(handle)
}
