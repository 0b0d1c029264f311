//! Registry webhook handling

pub mod events;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::deploy::command::DeployCommand;
use crate::errors::AgentError;
use crate::registry::events::{EventFilter, PushEvent};
use crate::telegram::{InlineButton, Messenger, CALLBACK_DATA_LIMIT};

pub const DEPLOY_BUTTON_LABEL: &str = "Deploy";

/// Result of processing one registry notification
pub struct PromptBatch {
    /// Accepted push events, in notification order
    pub events: Vec<PushEvent>,

    /// Detached prompt sends, one per event
    pub tasks: Vec<JoinHandle<()>>,
}

/// Turns registry notifications into approval prompts
pub struct PushNotifier {
    filter: EventFilter,
    messenger: Arc<dyn Messenger>,
}

impl PushNotifier {
    pub fn new(filter: EventFilter, messenger: Arc<dyn Messenger>) -> Self {
        Self { filter, messenger }
    }

    /// Filter a notification body and prompt for every accepted push.
    ///
    /// Prompts are sent from detached tasks; their failures are only logged.
    pub fn handle(&self, payload: &[u8]) -> PromptBatch {
        let events = self.filter.filter(payload);
        let tasks = events
            .iter()
            .map(|event| {
                info!("Push received: {}:{}", event.repository, event.tag);
                let messenger = self.messenger.clone();
                let event = event.clone();
                tokio::spawn(async move {
                    if let Err(e) = send_prompt(messenger.as_ref(), &event).await {
                        error!("Failed to send deploy prompt for {}: {}", event.tag, e);
                    }
                })
            })
            .collect();

        PromptBatch { events, tasks }
    }
}

/// Send the approval prompt for one push event.
///
/// Fails without sending when the encoded command does not fit in a button payload.
pub async fn send_prompt(messenger: &dyn Messenger, event: &PushEvent) -> Result<(), AgentError> {
    let payload = DeployCommand::deploy(event.tag.clone()).encode()?;
    if payload.len() > CALLBACK_DATA_LIMIT {
        return Err(AgentError::CommandError(format!(
            "tag '{}' is too long for a deploy button ({} bytes, limit {})",
            event.tag,
            payload.len(),
            CALLBACK_DATA_LIMIT
        )));
    }
    let text = format!("New image pushed: {}:{}", event.repository, event.tag);
    messenger
        .send_message(&text, Some(InlineButton::new(DEPLOY_BUTTON_LABEL, payload)))
        .await
}
