//! Approval gate for Telegram callbacks

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::deploy::command::DeployCommand;
use crate::deploy::orchestrator::{DeployOutcome, Orchestrator};
use crate::errors::AgentError;
use crate::telegram::models::Update;
use crate::telegram::Messenger;

/// What the gate did with an inbound update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// The update carried no callback query
    NoCallback,

    /// The callback came from someone other than the approver
    Unauthorized { sender: Option<String> },

    /// The callback payload was not a deploy command
    Ignored,

    /// The deploy command was handed to the orchestrator
    Dispatched(DeployOutcome),
}

/// Validates approval callbacks and triggers deploys
pub struct ApprovalGate {
    messenger: Arc<dyn Messenger>,
    orchestrator: Arc<Orchestrator>,
    approver: String,
}

impl ApprovalGate {
    pub fn new(
        messenger: Arc<dyn Messenger>,
        orchestrator: Arc<Orchestrator>,
        approver: impl Into<String>,
    ) -> Self {
        Self {
            messenger,
            orchestrator,
            approver: approver.into(),
        }
    }

    /// Process a raw webhook update.
    ///
    /// A present callback is always acknowledged first, whatever happens next.
    /// Only an acknowledgement failure is returned as an error.
    pub async fn handle(&self, payload: &[u8]) -> Result<GateOutcome, AgentError> {
        let update: Update = match serde_json::from_slice(payload) {
            Ok(update) => update,
            Err(e) => {
                debug!("Ignoring undecodable update: {}", e);
                return Ok(GateOutcome::NoCallback);
            }
        };
        let Some(query) = update.callback_query else {
            return Ok(GateOutcome::NoCallback);
        };

        self.messenger.answer_callback(&query.id).await?;

        let sender = query.sender_username();
        if sender != Some(self.approver.as_str()) {
            warn!(
                "Rejected callback {} from unauthorized sender {:?}",
                query.id, sender
            );
            return Ok(GateOutcome::Unauthorized {
                sender: sender.map(str::to_string),
            });
        }

        let command = DeployCommand::decode(query.data.as_deref().unwrap_or_default());
        if !command.is_deploy() {
            debug!("Callback {} carries no deploy command", query.id);
            return Ok(GateOutcome::Ignored);
        }

        info!("Deploy of {} approved by {}", command.tag, self.approver);
        let outcome = self.orchestrator.deploy(&command.tag).await;
        Ok(GateOutcome::Dispatched(outcome))
    }
}
