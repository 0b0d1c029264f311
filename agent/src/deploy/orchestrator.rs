//! Single-flight redeploy of the managed container

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use secrecy::SecretString;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::app::settings::ImageTemplate;
use crate::deploy::fsm::{DeployEvent, DeployFsm, DeployState};
use crate::docker::ContainerRuntime;
use crate::errors::AgentError;
use crate::telegram::Messenger;

/// What gets deployed, and where
#[derive(Debug, Clone)]
pub struct DeployTarget {
    /// Name of the managed container
    pub container_name: String,

    /// Network the container is attached to
    pub network: String,

    pub image_template: ImageTemplate,
    pub registry_username: String,
    pub registry_password: SecretString,
}

/// Steps of the redeploy sequence, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployStep {
    NotifyStart,
    Pull,
    Remove,
    Create,
    Start,
    NotifyDone,
}

impl fmt::Display for DeployStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeployStep::NotifyStart => "notify-start",
            DeployStep::Pull => "pull",
            DeployStep::Remove => "remove",
            DeployStep::Create => "create",
            DeployStep::Start => "start",
            DeployStep::NotifyDone => "notify-done",
        };
        f.write_str(name)
    }
}

/// Result of a deploy request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    /// The sequence ran to the end
    Deployed { container_id: String },

    /// A step failed; the remaining steps were not run
    Failed { step: DeployStep, error: String },

    /// Another deploy was in flight, the request was dropped
    Skipped,
}

/// Runs redeploys, at most one at a time
pub struct Orchestrator {
    runtime: Arc<dyn ContainerRuntime>,
    messenger: Arc<dyn Messenger>,
    target: DeployTarget,
    fsm: Mutex<DeployFsm>,
}

/// Held for the duration of one sequence; releases the guard on drop
struct FlightPermit<'a> {
    fsm: &'a Mutex<DeployFsm>,
}

impl Drop for FlightPermit<'_> {
    fn drop(&mut self) {
        let mut fsm = lock(self.fsm);
        if let Err(e) = fsm.process(DeployEvent::Finish) {
            error!("Failed to release deploy guard: {}", e);
        }
    }
}

fn lock(fsm: &Mutex<DeployFsm>) -> MutexGuard<'_, DeployFsm> {
    fsm.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Orchestrator {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        messenger: Arc<dyn Messenger>,
        target: DeployTarget,
    ) -> Self {
        Self {
            runtime,
            messenger,
            target,
            fsm: Mutex::new(DeployFsm::new()),
        }
    }

    /// Get the current deployment state
    pub fn state(&self) -> DeployState {
        lock(&self.fsm).state()
    }

    pub fn is_deploying(&self) -> bool {
        self.state() == DeployState::Deploying
    }

    /// Number of sequences that ran to an end, successfully or not
    pub fn completed(&self) -> u64 {
        lock(&self.fsm).completed()
    }

    /// Check-and-set of the guard. The lock is never held across an await.
    fn try_begin(&self, tag: &str) -> Option<FlightPermit<'_>> {
        let mut fsm = lock(&self.fsm);
        match fsm.process(DeployEvent::Begin {
            tag: tag.to_string(),
        }) {
            Ok(()) => Some(FlightPermit { fsm: &self.fsm }),
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    /// Redeploy the managed container with image tag `tag`.
    ///
    /// Returns [`DeployOutcome::Skipped`] without touching the runtime when a deploy is
    /// already running. Step failures are logged here and reported in the outcome.
    pub async fn deploy(&self, tag: &str) -> DeployOutcome {
        let Some(_permit) = self.try_begin(tag) else {
            return DeployOutcome::Skipped;
        };

        let deploy_id = uuid::Uuid::new_v4();
        let span = info_span!("deploy", %deploy_id, tag);

        match self.run_sequence(tag).instrument(span).await {
            Ok(container_id) => {
                info!(%deploy_id, tag, %container_id, "Deploy finished");
                DeployOutcome::Deployed { container_id }
            }
            Err(StepFailure { step, error }) => {
                error!(%deploy_id, tag, %step, "Deploy failed: {}", error);
                DeployOutcome::Failed {
                    step,
                    error: error.to_string(),
                }
            }
        }
    }

    async fn run_sequence(&self, tag: &str) -> Result<String, StepFailure> {
        let target = &self.target;
        let image = target.image_template.render(tag);
        let name = target.container_name.as_str();
        info!("Deploying {} as {}", image, name);

        step(DeployStep::NotifyStart, async {
            self.messenger
                .send_message(&format!("Deploying: {}", tag), None)
                .await
        })
        .await?;

        step(DeployStep::Pull, async {
            self.runtime
                .pull_image(&image, &target.registry_username, &target.registry_password)
                .await
        })
        .await?;

        let removed = step(DeployStep::Remove, async {
            self.runtime.remove_container(name, true).await
        })
        .await?;
        if !removed {
            debug!("No existing container named {}", name);
        }

        let container_id = step(DeployStep::Create, async {
            self.runtime
                .create_container(name, &image, &target.network)
                .await
        })
        .await?;

        let started = step(DeployStep::Start, async {
            self.runtime.start_container(&container_id).await
        })
        .await?;
        if !started {
            debug!("Container {} was already running", container_id);
        }

        step(DeployStep::NotifyDone, async {
            self.messenger
                .send_message(&format!("Deployed: {}", tag), None)
                .await
        })
        .await?;

        Ok(container_id)
    }
}

/// A sequence step and the error that stopped it
struct StepFailure {
    step: DeployStep,
    error: AgentError,
}

async fn step<T, F>(step: DeployStep, fut: F) -> Result<T, StepFailure>
where
    F: Future<Output = Result<T, AgentError>>,
{
    debug!(%step, "Running deploy step");
    fut.await.map_err(|error| StepFailure { step, error })
}
