//! Telegram Bot API messaging

pub mod client;
pub mod models;

use async_trait::async_trait;

use crate::errors::AgentError;

/// Maximum size in bytes of an inline button payload accepted by the Bot API
pub const CALLBACK_DATA_LIMIT: usize = 64;

/// A single actionable button attached to a message.
///
/// The payload is opaque to the recipient and echoed back verbatim in the
/// callback query when the button is pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub payload: String,
}

impl InlineButton {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

/// Outbound messaging operations used by the deploy flow
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a message to the configured chat, optionally with one inline button
    async fn send_message(&self, text: &str, button: Option<InlineButton>)
        -> Result<(), AgentError>;

    /// Acknowledge an inbound callback query
    async fn answer_callback(&self, callback_id: &str) -> Result<(), AgentError>;
}
