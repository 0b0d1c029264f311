//! Docker Engine API access

pub mod client;
pub mod models;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::docker::models::ContainerSummary;
use crate::errors::AgentError;

/// Container lifecycle operations against a local container runtime.
///
/// The boolean-returning operations report whether the call changed anything:
/// `false` means the container was already in the requested state.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>, AgentError>;

    async fn container_exists(&self, id: &str) -> Result<bool, AgentError>;

    async fn pull_image(
        &self,
        image: &str,
        username: &str,
        password: &SecretString,
    ) -> Result<(), AgentError>;

    /// Create a container and return its id
    async fn create_container(
        &self,
        name: &str,
        image: &str,
        network: &str,
    ) -> Result<String, AgentError>;

    async fn start_container(&self, id: &str) -> Result<bool, AgentError>;

    async fn stop_container(&self, id: &str) -> Result<bool, AgentError>;

    async fn kill_container(&self, id: &str) -> Result<bool, AgentError>;

    async fn remove_container(&self, id: &str, force: bool) -> Result<bool, AgentError>;
}
