//! HTTP surface tests

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower::ServiceExt;

use dockhand::app::options::AppOptions;
use dockhand::app::run::run_with_state;
use dockhand::app::settings::Settings;
use dockhand::app::state::AppState;
use dockhand::deploy::command::DeployCommand;
use dockhand::deploy::gate::ApprovalGate;
use dockhand::errors::AgentError;
use dockhand::registry::events::{EventFilter, MANIFEST_V2_MEDIA_TYPE};
use dockhand::registry::PushNotifier;
use dockhand::server::handlers::WEBHOOK_ACK;
use dockhand::server::serve::{router, REGISTRY_WEBHOOK_PATH, TELEGRAM_WEBHOOK_PATH};
use dockhand::server::state::ServerState;

use crate::common::{eventually, new_log, orchestrator, FakeMessenger, FakeRuntime, APP, APPROVER};

struct Harness {
    runtime: Arc<FakeRuntime>,
    messenger: Arc<FakeMessenger>,
    app: Router,
}

fn harness() -> Harness {
    let log = new_log();
    let runtime = Arc::new(FakeRuntime::new(log.clone()));
    let messenger = Arc::new(FakeMessenger::new(log));
    let orchestrator = orchestrator(runtime.clone(), messenger.clone());

    let notifier = Arc::new(PushNotifier::new(EventFilter::new(APP), messenger.clone()));
    let gate = Arc::new(ApprovalGate::new(
        messenger.clone(),
        orchestrator.clone(),
        APPROVER,
    ));
    let state = Arc::new(ServerState::new(notifier, gate, orchestrator));

    Harness {
        runtime,
        messenger,
        app: router(state),
    }
}

async fn post(app: &Router, path: &str, body: impl Into<Body>) -> (StatusCode, String) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn push_notification(tag: &str) -> String {
    json!({
        "events": [{
            "action": "push",
            "target": { "mediaType": MANIFEST_V2_MEDIA_TYPE, "repository": APP, "tag": tag }
        }]
    })
    .to_string()
}

#[tokio::test]
async fn test_registry_webhook_always_acknowledges() {
    let h = harness();

    for body in ["", "garbage", "{\"events\":42}", "{\"events\":[]}"] {
        let (status, text) = post(&h.app, REGISTRY_WEBHOOK_PATH, body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(text, WEBHOOK_ACK);
    }
    assert!(h.messenger.texts().is_empty());
}

#[tokio::test]
async fn test_registry_push_sends_prompt() {
    let h = harness();

    let (status, text) = post(&h.app, REGISTRY_WEBHOOK_PATH, push_notification("v2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, WEBHOOK_ACK);

    assert!(eventually(|| h.messenger.texts() == vec!["New image pushed: myapp:v2"]).await);
    assert!(h.runtime.calls().is_empty());
}

#[tokio::test]
async fn test_telegram_webhook_always_acknowledges() {
    let h = harness();

    for body in ["", "garbage", "{\"update_id\":1}"] {
        let (status, text) = post(&h.app, TELEGRAM_WEBHOOK_PATH, body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(text, WEBHOOK_ACK);
    }
}

#[tokio::test]
async fn test_approved_callback_triggers_deploy() {
    let h = harness();
    let update = json!({
        "update_id": 7,
        "callback_query": {
            "id": "cb-1",
            "data": DeployCommand::deploy("v2").encode().unwrap(),
            "message": { "chat": { "username": APPROVER } }
        }
    });

    let (status, _) = post(&h.app, TELEGRAM_WEBHOOK_PATH, update.to_string()).await;
    assert_eq!(status, StatusCode::OK);

    assert!(eventually(|| h.messenger.texts().len() == 2).await);
    assert_eq!(h.messenger.acks(), vec!["cb-1"]);
    assert_eq!(h.runtime.calls().len(), 4);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let h = harness();

    let (status, _) = post(&h.app, "/registry", "{}").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let request = Request::builder()
        .uri(REGISTRY_WEBHOOK_PATH)
        .body(Body::empty())
        .unwrap();
    let response = h.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_health_reports_deploy_state() {
    let h = harness();

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = h.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let health: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["service"], "dockhand");
    assert_eq!(health["deploy_state"], "idle");
    assert_eq!(health["deploys_completed"], 0);
}

fn options(host: &str, port: u16) -> AppOptions {
    let port = port.to_string();
    let env = HashMap::from([
        ("APP_NAME", APP),
        ("REGISTRY_HOST", "registry.example.com"),
        ("REGISTRY_USERNAME", "ci"),
        ("REGISTRY_PASSWORD", "hunter2"),
        ("TELEGRAM_BOT_TOKEN", "123:abc"),
        ("TELEGRAM_CHAT_ID", "-100"),
        ("APPROVER_USERNAME", APPROVER),
        ("DOCKER_NETWORK", "web"),
        ("HOST", host),
        ("PORT", port.as_str()),
    ]);
    let settings = Settings::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap();
    AppOptions::from_settings(&settings)
}

fn app_state(options: &AppOptions) -> Arc<AppState> {
    let log = new_log();
    Arc::new(AppState::with_clients(
        options,
        Arc::new(FakeRuntime::new(log.clone())),
        Arc::new(FakeMessenger::new(log)),
    ))
}

#[tokio::test]
async fn test_run_serves_until_shutdown() {
    let free_port = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = free_port.local_addr().unwrap().port();
    drop(free_port);

    let options = options("127.0.0.1", port);
    let state = app_state(&options);
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let agent = tokio::spawn(run_with_state(options, state, async move {
        let _ = stop_rx.await;
    }));

    let url = format!("http://127.0.0.1:{}/health", port);
    let mut healthy = false;
    for _ in 0..50 {
        if let Ok(response) = reqwest::get(&url).await {
            healthy = response.status().is_success();
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert!(healthy);

    stop_tx.send(()).unwrap();
    assert!(agent.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_run_fails_when_port_is_taken() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = taken.local_addr().unwrap().port();

    let options = options("127.0.0.1", port);
    let state = app_state(&options);

    let err = run_with_state(options, state, std::future::pending())
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::ServerError(_)));
}
