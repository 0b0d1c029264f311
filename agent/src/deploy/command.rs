//! Deploy command carried through the approval button

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AgentError;

/// Kind of command embedded in a callback payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Deploy,
}

/// Command embedded in the approval button payload.
///
/// The empty command (no kind) is what an undecodable payload turns into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployCommand {
    #[serde(default)]
    pub command: Option<CommandKind>,

    #[serde(default)]
    pub tag: String,
}

impl DeployCommand {
    pub fn deploy(tag: impl Into<String>) -> Self {
        Self {
            command: Some(CommandKind::Deploy),
            tag: tag.into(),
        }
    }

    pub fn is_deploy(&self) -> bool {
        self.command == Some(CommandKind::Deploy)
    }

    /// Encode as the opaque button payload
    pub fn encode(&self) -> Result<String, AgentError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a button payload, falling back to the empty command
    pub fn decode(payload: &str) -> Self {
        serde_json::from_str(payload).unwrap_or_else(|e| {
            debug!("Undecodable callback payload: {}", e);
            Self::default()
        })
    }
}
