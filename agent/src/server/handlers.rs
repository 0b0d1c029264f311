//! HTTP request handlers

use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tracing::{debug, error};

use crate::deploy::fsm::DeployState;
use crate::deploy::gate::GateOutcome;
use crate::server::state::ServerState;
use crate::utils::version_info;

/// Body every webhook answers with
pub const WEBHOOK_ACK: &str = "OK";

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub deploy_state: DeployState,
    pub deploys_completed: u64,
}

/// Health check handler
pub async fn health_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "dockhand".to_string(),
        version: version.version,
        deploy_state: state.orchestrator.state(),
        deploys_completed: state.orchestrator.completed(),
    })
}

/// Registry notification handler.
///
/// The body is taken raw so a malformed notification still gets a 200; prompts are
/// sent in the background.
pub async fn registry_handler(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> impl IntoResponse {
    let batch = state.notifier.handle(&body);
    debug!("Registry notification: {} push event(s) accepted", batch.events.len());
    (StatusCode::OK, WEBHOOK_ACK)
}

/// Telegram update handler. The gate runs detached from the response.
pub async fn telegram_handler(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> impl IntoResponse {
    let gate = state.gate.clone();
    tokio::spawn(async move {
        match gate.handle(&body).await {
            Ok(GateOutcome::NoCallback) => {}
            Ok(outcome) => debug!("Callback handled: {:?}", outcome),
            Err(e) => error!("Failed to handle callback: {}", e),
        }
    });
    (StatusCode::OK, WEBHOOK_ACK)
}
