//! Finite State Machine for the single-flight deploy guard

use serde::{Deserialize, Serialize};

/// Deployment state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployState {
    /// No deploy running
    Idle,

    /// A deploy sequence is in flight
    Deploying,
}

/// Deployment event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployEvent {
    /// A deploy request was accepted
    Begin { tag: String },

    /// The running sequence ended, successfully or not
    Finish,
}

/// Deployment FSM
#[derive(Debug, Clone)]
pub struct DeployFsm {
    state: DeployState,
    current_tag: Option<String>,
    completed: u64,
}

impl DeployFsm {
    /// Create a new FSM in idle state
    pub fn new() -> Self {
        Self {
            state: DeployState::Idle,
            current_tag: None,
            completed: 0,
        }
    }

    /// Get current state
    pub fn state(&self) -> DeployState {
        self.state
    }

    /// Tag of the deploy in flight, if any
    pub fn current_tag(&self) -> Option<&str> {
        self.current_tag.as_deref()
    }

    /// Number of sequences that ran to an end since start-up
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: DeployEvent) -> Result<(), String> {
        let new_state = match (self.state, event) {
            (DeployState::Idle, DeployEvent::Begin { tag }) => {
                self.current_tag = Some(tag);
                DeployState::Deploying
            }
            (DeployState::Deploying, DeployEvent::Finish) => {
                self.current_tag = None;
                self.completed += 1;
                DeployState::Idle
            }

            // Invalid transitions
            (DeployState::Deploying, DeployEvent::Begin { tag }) => {
                return Err(format!(
                    "Deploy of {} already in progress, rejecting {}",
                    self.current_tag.as_deref().unwrap_or("?"),
                    tag
                ));
            }
            (state, event) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", state, event));
            }
        };

        self.state = new_state;
        Ok(())
    }
}

impl Default for DeployFsm {
    fn default() -> Self {
        Self::new()
    }
}
