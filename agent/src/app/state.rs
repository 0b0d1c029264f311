//! Application state management

use std::sync::Arc;

use tracing::info;

use crate::app::options::AppOptions;
use crate::deploy::gate::ApprovalGate;
use crate::deploy::orchestrator::Orchestrator;
use crate::docker::client::DockerClient;
use crate::docker::ContainerRuntime;
use crate::errors::AgentError;
use crate::registry::events::EventFilter;
use crate::registry::PushNotifier;
use crate::telegram::client::TelegramClient;
use crate::telegram::Messenger;

/// Main application state
pub struct AppState {
    /// Deploy orchestrator, owner of the single-flight guard
    pub orchestrator: Arc<Orchestrator>,

    /// Registry notification handling
    pub notifier: Arc<PushNotifier>,

    /// Callback approval handling
    pub gate: Arc<ApprovalGate>,
}

impl AppState {
    /// Initialize application state with the real Docker and Telegram clients
    pub fn init(options: &AppOptions) -> Result<Self, AgentError> {
        info!("Initializing application state...");

        let runtime: Arc<dyn ContainerRuntime> = Arc::new(DockerClient::new(
            &options.docker.socket,
            &options.docker.api_version,
        ));
        let messenger: Arc<dyn Messenger> = Arc::new(TelegramClient::new(
            &options.telegram.api_url,
            options.telegram.bot_token.clone(),
            &options.telegram.chat_id,
        )?);

        Ok(Self::with_clients(options, runtime, messenger))
    }

    /// Wire the components around the given clients
    pub fn with_clients(
        options: &AppOptions,
        runtime: Arc<dyn ContainerRuntime>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        let orchestrator = Arc::new(Orchestrator::new(
            runtime,
            messenger.clone(),
            options.target.clone(),
        ));
        let notifier = Arc::new(PushNotifier::new(
            EventFilter::new(options.app_name.clone()),
            messenger.clone(),
        ));
        let gate = Arc::new(ApprovalGate::new(
            messenger,
            orchestrator.clone(),
            options.telegram.approver.clone(),
        ));

        Self {
            orchestrator,
            notifier,
            gate,
        }
    }

    /// Shutdown application state
    pub async fn shutdown(&self) -> Result<(), AgentError> {
        info!("Shutting down application state...");
        if self.orchestrator.is_deploying() {
            info!("A deploy is still in flight; it is abandoned with the process");
        }
        Ok(())
    }
}
