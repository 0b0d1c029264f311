//! Docker Engine API payloads

use serde::{Deserialize, Serialize};

/// Entry of `GET /containers/json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerSummary {
    pub id: String,

    #[serde(default)]
    pub names: Vec<String>,

    #[serde(default)]
    pub image: String,

    #[serde(default)]
    pub state: String,

    #[serde(default)]
    pub status: String,
}

/// `POST /containers/create` body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateContainer<'a> {
    pub image: &'a str,
    pub host_config: HostConfig<'a>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct HostConfig<'a> {
    pub network_mode: &'a str,
}

/// `POST /containers/create` response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreatedContainer {
    pub id: String,

    #[serde(default)]
    pub warnings: Option<Vec<String>>,
}

/// Decoded form of the `X-Registry-Auth` header
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub struct RegistryAuth<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub serveraddress: &'a str,
}

/// One record of the image pull progress stream
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullProgress {
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub error: Option<String>,
}
