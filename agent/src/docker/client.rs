//! Docker Engine API client over the local unix socket

use std::path::PathBuf;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use futures::TryStreamExt;
use http::header::CONTENT_TYPE;
use http::{Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper_util::client::legacy::Client;
use hyperlocal::{UnixClientExt, UnixConnector, Uri};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, warn};

use crate::docker::models::{
    ContainerSummary, CreateContainer, CreatedContainer, HostConfig, PullProgress, RegistryAuth,
};
use crate::docker::ContainerRuntime;
use crate::errors::AgentError;

const REGISTRY_AUTH_HEADER: &str = "X-Registry-Auth";
const DEFAULT_REGISTRY: &str = "docker.io";

/// Docker Engine API client
pub struct DockerClient {
    client: Client<UnixConnector, Full<Bytes>>,
    socket: PathBuf,
    api_prefix: String,
}

impl DockerClient {
    /// Create a client for the engine listening on `socket`, using API version `api_version`
    /// (for example `v1.43`)
    pub fn new(socket: impl Into<PathBuf>, api_version: &str) -> Self {
        Self {
            client: Client::unix(),
            socket: socket.into(),
            api_prefix: format!("/{}", api_version.trim_matches('/')),
        }
    }

    fn uri(&self, path: &str, query: &[(&str, &str)]) -> hyper::Uri {
        let mut path_and_query = format!("{}{}", self.api_prefix, path);
        if !query.is_empty() {
            let encoded = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(query)
                .finish();
            path_and_query.push('?');
            path_and_query.push_str(&encoded);
        }
        Uri::new(&self.socket, &path_and_query).into()
    }

    async fn send(
        &self,
        method: Method,
        uri: hyper::Uri,
        headers: &[(&str, String)],
        body: Option<Vec<u8>>,
    ) -> Result<Response<Incoming>, AgentError> {
        debug!("{} {}", method, uri.path());

        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        for (name, value) in headers {
            builder = builder.header(*name, value);
        }
        let request = builder
            .body(Full::new(Bytes::from(body.unwrap_or_default())))
            .map_err(|e| AgentError::TransportError(format!("Failed to build request: {}", e)))?;

        Ok(self.client.request(request).await?)
    }

    /// Send a request and read the whole response body
    async fn call(
        &self,
        method: Method,
        uri: hyper::Uri,
        body: Option<Vec<u8>>,
    ) -> Result<(StatusCode, Bytes), AgentError> {
        let response = self.send(method, uri, &[], body).await?;
        let status = response.status();
        let body = response.into_body().collect().await?.to_bytes();
        Ok((status, body))
    }

    /// POST/DELETE on a container where one non-2xx status means "nothing to do"
    async fn container_action(
        &self,
        method: Method,
        uri: hyper::Uri,
        tolerated: StatusCode,
    ) -> Result<bool, AgentError> {
        let (status, body) = self.call(method, uri, None).await?;
        interpret_tolerant(status, tolerated, &body)
    }
}

/// Map a response status to `Ok(true)` on success, `Ok(false)` on the tolerated status and a
/// protocol error otherwise
pub fn interpret_tolerant(
    status: StatusCode,
    tolerated: StatusCode,
    body: &[u8],
) -> Result<bool, AgentError> {
    if status.is_success() {
        Ok(true)
    } else if status == tolerated {
        Ok(false)
    } else {
        Err(protocol_error(status, body))
    }
}

fn expect_success(status: StatusCode, body: &[u8]) -> Result<(), AgentError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(protocol_error(status, body))
    }
}

fn protocol_error(status: StatusCode, body: &[u8]) -> AgentError {
    let body = String::from_utf8_lossy(body).trim().to_string();
    error!("Docker API returned {}: {}", status, body);
    AgentError::ProtocolError {
        status: status.as_u16(),
        body,
    }
}

/// Registry host part of an image reference
pub fn registry_host(image: &str) -> &str {
    match image.split_once('/') {
        Some((first, _)) if first.contains('.') || first.contains(':') || first == "localhost" => {
            first
        }
        _ => DEFAULT_REGISTRY,
    }
}

/// Encode registry credentials the way the engine expects in `X-Registry-Auth`
pub fn encode_registry_auth(
    username: &str,
    password: &str,
    serveraddress: &str,
) -> Result<String, AgentError> {
    let auth = RegistryAuth {
        username,
        password,
        serveraddress,
    };
    Ok(URL_SAFE.encode(serde_json::to_vec(&auth)?))
}

/// Inspect one line of the pull progress stream
fn check_pull_progress(line: &[u8]) -> Result<(), AgentError> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return Ok(());
    }
    match serde_json::from_slice::<PullProgress>(line) {
        Ok(PullProgress {
            error: Some(message),
            ..
        }) => {
            error!("Image pull reported: {}", message);
            Err(AgentError::PullError(message))
        }
        Ok(progress) => {
            if let Some(status) = progress.status {
                debug!("pull: {}", status);
            }
            Ok(())
        }
        Err(e) => {
            warn!("Unparseable pull progress record: {}", e);
            Ok(())
        }
    }
}

#[async_trait]
impl ContainerRuntime for DockerClient {
    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>, AgentError> {
        let uri = self.uri("/containers/json", &[("all", bool_param(all))]);
        let (status, body) = self.call(Method::GET, uri, None).await?;
        expect_success(status, &body)?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn container_exists(&self, id: &str) -> Result<bool, AgentError> {
        let filters = serde_json::json!({ "id": [id] }).to_string();
        let uri = self.uri("/containers/json", &[("all", "true"), ("filters", filters.as_str())]);
        let (status, body) = self.call(Method::GET, uri, None).await?;
        expect_success(status, &body)?;
        let containers: Vec<ContainerSummary> = serde_json::from_slice(&body)?;
        Ok(!containers.is_empty())
    }

    async fn pull_image(
        &self,
        image: &str,
        username: &str,
        password: &SecretString,
    ) -> Result<(), AgentError> {
        let auth = encode_registry_auth(username, password.expose_secret(), registry_host(image))?;
        let uri = self.uri("/images/create", &[("fromImage", image)]);
        let response = self
            .send(Method::POST, uri, &[(REGISTRY_AUTH_HEADER, auth)], None)
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.into_body().collect().await?.to_bytes();
            return Err(protocol_error(status, &body));
        }

        // The engine streams newline-delimited progress records; the pull is only done
        // once the stream ends, and failures can show up inside it with a 200 status.
        let mut stream = response.into_body().into_data_stream();
        let mut pending: Vec<u8> = Vec::new();
        while let Some(chunk) = stream.try_next().await? {
            pending.extend_from_slice(&chunk);
            while let Some(pos) = pending.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = pending.drain(..=pos).collect();
                check_pull_progress(&line)?;
            }
        }
        check_pull_progress(&pending)
    }

    async fn create_container(
        &self,
        name: &str,
        image: &str,
        network: &str,
    ) -> Result<String, AgentError> {
        let body = serde_json::to_vec(&CreateContainer {
            image,
            host_config: HostConfig {
                network_mode: network,
            },
        })?;
        let uri = self.uri("/containers/create", &[("name", name)]);
        let (status, body) = self.call(Method::POST, uri, Some(body)).await?;
        expect_success(status, &body)?;

        let created: CreatedContainer = serde_json::from_slice(&body)?;
        for warning in created.warnings.iter().flatten() {
            warn!("Container {} created with warning: {}", name, warning);
        }
        Ok(created.id)
    }

    async fn start_container(&self, id: &str) -> Result<bool, AgentError> {
        let uri = self.uri(&format!("/containers/{}/start", id), &[]);
        self.container_action(Method::POST, uri, StatusCode::NOT_MODIFIED)
            .await
    }

    async fn stop_container(&self, id: &str) -> Result<bool, AgentError> {
        let uri = self.uri(&format!("/containers/{}/stop", id), &[]);
        self.container_action(Method::POST, uri, StatusCode::NOT_MODIFIED)
            .await
    }

    async fn kill_container(&self, id: &str) -> Result<bool, AgentError> {
        let uri = self.uri(&format!("/containers/{}/kill", id), &[]);
        self.container_action(Method::POST, uri, StatusCode::CONFLICT)
            .await
    }

    async fn remove_container(&self, id: &str, force: bool) -> Result<bool, AgentError> {
        let uri = self.uri(&format!("/containers/{}", id), &[("force", bool_param(force))]);
        self.container_action(Method::DELETE, uri, StatusCode::NOT_FOUND)
            .await
    }
}

fn bool_param(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
