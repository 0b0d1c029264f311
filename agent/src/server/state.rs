//! Server state

use std::sync::Arc;

use crate::deploy::gate::ApprovalGate;
use crate::deploy::orchestrator::Orchestrator;
use crate::registry::PushNotifier;

/// Server state shared across handlers
pub struct ServerState {
    pub notifier: Arc<PushNotifier>,
    pub gate: Arc<ApprovalGate>,
    pub orchestrator: Arc<Orchestrator>,
}

impl ServerState {
    pub fn new(
        notifier: Arc<PushNotifier>,
        gate: Arc<ApprovalGate>,
        orchestrator: Arc<Orchestrator>,
    ) -> Self {
        Self {
            notifier,
            gate,
            orchestrator,
        }
    }
}
