//! Build metadata

use serde::{Deserialize, Serialize};

/// Version stamp printed by `--version` and reported by the health endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub name: String,
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

pub fn version_info() -> VersionInfo {
    VersionInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("DOCKHAND_GIT_HASH")
            .unwrap_or("unknown")
            .to_string(),
        build_time: option_env!("DOCKHAND_BUILD_TIME")
            .unwrap_or("unknown")
            .to_string(),
    }
}
