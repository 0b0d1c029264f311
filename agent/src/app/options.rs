//! Application configuration options

use std::time::Duration;

use crate::app::settings::Settings;
use crate::deploy::orchestrator::DeployTarget;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Server configuration
    pub server: ServerOptions,

    /// Application name, matched against pushed repositories
    pub app_name: String,

    /// Deploy target
    pub target: DeployTarget,

    /// Docker Engine endpoint
    pub docker: DockerOptions,

    /// Telegram endpoint and approver
    pub telegram: TelegramOptions,
}

impl AppOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            server: ServerOptions {
                host: settings.host.clone(),
                port: settings.port,
            },
            app_name: settings.app_name.clone(),
            target: DeployTarget {
                container_name: settings.app_name.clone(),
                network: settings.docker.network.clone(),
                image_template: settings.registry.image_template.clone(),
                registry_username: settings.registry.username.clone(),
                registry_password: settings.registry.password.clone(),
            },
            docker: DockerOptions {
                socket: settings.docker.socket.clone(),
                api_version: settings.docker.api_version.clone(),
            },
            telegram: TelegramOptions {
                api_url: settings.telegram.api_url.clone(),
                bot_token: settings.telegram.bot_token.clone(),
                chat_id: settings.telegram.chat_id.clone(),
                approver: settings.telegram.approver.clone(),
            },
        }
    }
}

/// Lifecycle options for the agent
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

/// HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DockerOptions {
    pub socket: String,
    pub api_version: String,
}

#[derive(Debug, Clone)]
pub struct TelegramOptions {
    pub api_url: String,
    pub bot_token: secrecy::SecretString,
    pub chat_id: String,
    pub approver: String,
}
