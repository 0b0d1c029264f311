//! Error types for the dockhand agent

use thiserror::Error;

/// Main error type for the dockhand agent
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The outbound request itself failed (connect, write, read)
    #[error("Transport error: {0}")]
    TransportError(String),

    /// The remote answered with a status outside the accepted range
    #[error("Unexpected status {status}: {body}")]
    ProtocolError { status: u16, body: String },

    /// The engine accepted the pull but reported a failure inside the progress stream
    #[error("Image pull failed: {0}")]
    PullError(String),

    #[error("Command error: {0}")]
    CommandError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<reqwest::Error> for AgentError {
    /// The URL is dropped: Bot API URLs carry the token in their path.
    fn from(err: reqwest::Error) -> Self {
        AgentError::TransportError(err.without_url().to_string())
    }
}

impl From<hyper_util::client::legacy::Error> for AgentError {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        AgentError::TransportError(err.to_string())
    }
}

impl From<hyper::Error> for AgentError {
    fn from(err: hyper::Error) -> Self {
        AgentError::TransportError(err.to_string())
    }
}

impl AgentError {
    /// Status code carried by a protocol error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            AgentError::ProtocolError { status, .. } => Some(*status),
            _ => None,
        }
    }
}
