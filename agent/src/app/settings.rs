//! Environment-sourced agent settings

use secrecy::SecretString;

use crate::errors::AgentError;
use crate::logs::LogLevel;

pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_DOCKER_SOCKET: &str = "/var/run/docker.sock";
pub const DEFAULT_DOCKER_API_VERSION: &str = "v1.43";

/// Placeholder substituted with the image tag in [`ImageTemplate`]
pub const TAG_PLACEHOLDER: &str = "{tag}";

/// Agent settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Log level
    pub log_level: LogLevel,

    /// Emit JSON log records
    pub log_json: bool,

    /// Listen host
    pub host: String,

    /// Listen port
    pub port: u16,

    /// Application name; doubles as the repository name and the container name
    pub app_name: String,

    /// Registry configuration
    pub registry: RegistrySettings,

    /// Telegram configuration
    pub telegram: TelegramSettings,

    /// Docker configuration
    pub docker: DockerSettings,
}

/// Container registry settings
#[derive(Debug, Clone)]
pub struct RegistrySettings {
    pub host: String,
    pub username: String,
    pub password: SecretString,
    pub image_template: ImageTemplate,
}

/// Telegram Bot API settings
#[derive(Debug, Clone)]
pub struct TelegramSettings {
    pub api_url: String,
    pub bot_token: SecretString,
    pub chat_id: String,

    /// The only username allowed to approve a deploy
    pub approver: String,
}

/// Docker Engine settings
#[derive(Debug, Clone)]
pub struct DockerSettings {
    pub socket: String,
    pub api_version: String,
    pub network: String,
}

/// Image reference with a `{tag}` placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTemplate(String);

impl ImageTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self, AgentError> {
        let template = template.into();
        if !template.contains(TAG_PLACEHOLDER) {
            return Err(AgentError::ConfigError(format!(
                "Image template '{}' has no {} placeholder",
                template, TAG_PLACEHOLDER
            )));
        }
        Ok(Self(template))
    }

    /// Default template: `{host}/{app}:{tag}`
    pub fn for_app(registry_host: &str, app_name: &str) -> Self {
        Self(format!(
            "{}/{}:{}",
            registry_host.trim_end_matches('/'),
            app_name,
            TAG_PLACEHOLDER
        ))
    }

    pub fn render(&self, tag: &str) -> String {
        self.0.replace(TAG_PLACEHOLDER, tag)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Settings {
    /// Load settings from the process environment
    pub fn from_env() -> Result<Self, AgentError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AgentError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| {
                AgentError::ConfigError(format!("Missing environment variable {}", key))
            })
        };

        let log_level = match get("LOG_LEVEL") {
            Some(level) => level.parse().map_err(AgentError::ConfigError)?,
            None => LogLevel::default(),
        };
        let log_json = get("LOG_JSON")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let port = match get("PORT") {
            Some(port) => port
                .parse::<u16>()
                .map_err(|e| AgentError::ConfigError(format!("Invalid PORT '{}': {}", port, e)))?,
            None => 8080,
        };

        let app_name = require("APP_NAME")?;
        let registry_host = require("REGISTRY_HOST")?;
        let image_template = match get("IMAGE_TEMPLATE") {
            Some(template) => ImageTemplate::new(template)?,
            None => ImageTemplate::for_app(&registry_host, &app_name),
        };

        Ok(Self {
            log_level,
            log_json,
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            registry: RegistrySettings {
                host: registry_host,
                username: require("REGISTRY_USERNAME")?,
                password: SecretString::from(require("REGISTRY_PASSWORD")?),
                image_template,
            },
            telegram: TelegramSettings {
                api_url: get("TELEGRAM_API_URL")
                    .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
                bot_token: SecretString::from(require("TELEGRAM_BOT_TOKEN")?),
                chat_id: require("TELEGRAM_CHAT_ID")?,
                approver: require("APPROVER_USERNAME")?,
            },
            docker: DockerSettings {
                socket: get("DOCKER_SOCKET").unwrap_or_else(|| DEFAULT_DOCKER_SOCKET.to_string()),
                api_version: get("DOCKER_API_VERSION")
                    .unwrap_or_else(|| DEFAULT_DOCKER_API_VERSION.to_string()),
                network: require("DOCKER_NETWORK")?,
            },
            app_name,
        })
    }
}
