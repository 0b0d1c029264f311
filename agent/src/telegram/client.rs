//! Telegram Bot API client

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error};
use url::Url;

use crate::errors::AgentError;
use crate::telegram::models::{InlineKeyboardMarkup, SendMessage};
use crate::telegram::{InlineButton, Messenger};

/// HTTP client for the Telegram Bot API
pub struct TelegramClient {
    client: Client,
    api_url: String,
    bot_token: SecretString,
    chat_id: String,
}

impl TelegramClient {
    /// Create a new Telegram client bound to one destination chat
    pub fn new(api_url: &str, bot_token: SecretString, chat_id: &str) -> Result<Self, AgentError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            bot_token,
            chat_id: chat_id.to_string(),
        })
    }

    /// Build the URL of a Bot API method. The token is part of the path.
    fn method_url(&self, method: &str) -> Result<Url, AgentError> {
        let raw = format!("{}/bot{}/{}", self.api_url, self.bot_token.expose_secret(), method);
        Url::parse(&raw)
            .map_err(|e| AgentError::ConfigError(format!("Invalid Telegram URL: {}", e)))
    }

    async fn check(method: &str, response: Response) -> Result<(), AgentError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Telegram {} failed: {} - {}", method, status, body);
            return Err(AgentError::ProtocolError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_message(
        &self,
        text: &str,
        button: Option<InlineButton>,
    ) -> Result<(), AgentError> {
        let url = self.method_url("sendMessage")?;
        debug!("POST sendMessage ({} chars)", text.len());

        let body = SendMessage {
            chat_id: &self.chat_id,
            text,
            reply_markup: button.map(|b| InlineKeyboardMarkup::single(b.label, b.payload)),
        };

        let response = self.client.post(url).json(&body).send().await?;
        Self::check("sendMessage", response).await
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), AgentError> {
        let mut url = self.method_url("answerCallbackQuery")?;
        url.query_pairs_mut()
            .append_pair("callback_query_id", callback_id);
        debug!("GET answerCallbackQuery ({})", callback_id);

        let response = self.client.get(url).send().await?;
        Self::check("answerCallbackQuery", response).await
    }
}
