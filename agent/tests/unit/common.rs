//! In-memory doubles of the Docker and Telegram clients
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::sync::Notify;

use dockhand::app::settings::ImageTemplate;
use dockhand::deploy::orchestrator::{DeployTarget, Orchestrator};
use dockhand::docker::models::ContainerSummary;
use dockhand::docker::ContainerRuntime;
use dockhand::errors::AgentError;
use dockhand::telegram::{InlineButton, Messenger};

pub const APP: &str = "myapp";
pub const NETWORK: &str = "web";
pub const APPROVER: &str = "alice";

/// Shared, ordered record of every client call
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

pub fn target() -> DeployTarget {
    DeployTarget {
        container_name: APP.to_string(),
        network: NETWORK.to_string(),
        image_template: ImageTemplate::for_app("registry.example.com", APP),
        registry_username: "ci".to_string(),
        registry_password: SecretString::from("hunter2"),
    }
}

fn failure(op: &str) -> AgentError {
    AgentError::ProtocolError {
        status: 500,
        body: format!("{} exploded", op),
    }
}

/// Lets a test hold a deploy inside the pull step
#[derive(Default)]
pub struct PullGate {
    pub entered: Notify,
    pub release: Notify,
}

#[derive(Default)]
pub struct FakeRuntime {
    pub log: CallLog,
    pub fail_on: Mutex<Option<&'static str>>,
    pub pull_gate: Option<Arc<PullGate>>,
}

impl FakeRuntime {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            ..Default::default()
        }
    }

    pub fn failing_on(log: CallLog, op: &'static str) -> Self {
        Self {
            log,
            fail_on: Mutex::new(Some(op)),
            pull_gate: None,
        }
    }

    pub fn set_fail_on(&self, op: Option<&'static str>) {
        *self.fail_on.lock().unwrap() = op;
    }

    fn record(&self, op: &'static str, entry: String) -> Result<(), AgentError> {
        self.log.lock().unwrap().push(entry);
        if *self.fail_on.lock().unwrap() == Some(op) {
            return Err(failure(op));
        }
        Ok(())
    }

    /// Runtime calls only, messaging entries filtered out
    pub fn calls(&self) -> Vec<String> {
        entries(&self.log)
            .into_iter()
            .filter(|e| !e.starts_with("send:") && !e.starts_with("ack:"))
            .collect()
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>, AgentError> {
        self.record("list", format!("list:{}", all))?;
        Ok(Vec::new())
    }

    async fn container_exists(&self, id: &str) -> Result<bool, AgentError> {
        self.record("exists", format!("exists:{}", id))?;
        Ok(false)
    }

    async fn pull_image(
        &self,
        image: &str,
        username: &str,
        _password: &SecretString,
    ) -> Result<(), AgentError> {
        self.record("pull", format!("pull:{}:{}", image, username))?;
        if let Some(gate) = &self.pull_gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        Ok(())
    }

    async fn create_container(
        &self,
        name: &str,
        image: &str,
        network: &str,
    ) -> Result<String, AgentError> {
        self.record("create", format!("create:{}:{}:{}", name, image, network))?;
        Ok(format!("{}-id", name))
    }

    async fn start_container(&self, id: &str) -> Result<bool, AgentError> {
        self.record("start", format!("start:{}", id))?;
        Ok(true)
    }

    async fn stop_container(&self, id: &str) -> Result<bool, AgentError> {
        self.record("stop", format!("stop:{}", id))?;
        Ok(true)
    }

    async fn kill_container(&self, id: &str) -> Result<bool, AgentError> {
        self.record("kill", format!("kill:{}", id))?;
        Ok(true)
    }

    async fn remove_container(&self, id: &str, force: bool) -> Result<bool, AgentError> {
        self.record("remove", format!("remove:{}:{}", id, force))?;
        Ok(true)
    }
}

#[derive(Default)]
pub struct FakeMessenger {
    pub log: CallLog,
    pub sent: Mutex<Vec<(String, Option<InlineButton>)>>,
    pub acks: Mutex<Vec<String>>,
    pub fail_send: bool,
    pub fail_ack: bool,
}

impl FakeMessenger {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            ..Default::default()
        }
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(text, _)| text.clone())
            .collect()
    }

    pub fn acks(&self) -> Vec<String> {
        self.acks.lock().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for FakeMessenger {
    async fn send_message(
        &self,
        text: &str,
        button: Option<InlineButton>,
    ) -> Result<(), AgentError> {
        self.log.lock().unwrap().push(format!("send:{}", text));
        if self.fail_send {
            return Err(failure("send"));
        }
        self.sent.lock().unwrap().push((text.to_string(), button));
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), AgentError> {
        self.log.lock().unwrap().push(format!("ack:{}", callback_id));
        self.acks.lock().unwrap().push(callback_id.to_string());
        if self.fail_ack {
            return Err(failure("ack"));
        }
        Ok(())
    }
}

pub fn orchestrator(runtime: Arc<FakeRuntime>, messenger: Arc<FakeMessenger>) -> Arc<Orchestrator> {
    Arc::new(Orchestrator::new(runtime, messenger, target()))
}

/// Poll `check` until it holds or a second has passed
pub async fn eventually<F>(check: F) -> bool
where
    F: Fn() -> bool,
{
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
