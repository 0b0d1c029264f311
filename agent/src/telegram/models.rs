//! Telegram Bot API wire types
//!
//! Only the fields the agent reads or writes are modelled.

use serde::{Deserialize, Serialize};

/// Inbound webhook update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

/// Interactive callback produced by pressing an inline button
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,

    #[serde(default)]
    pub data: Option<String>,

    #[serde(default)]
    pub message: Option<Message>,
}

impl CallbackQuery {
    /// Username of the chat the button was pressed in
    pub fn sender_username(&self) -> Option<&str> {
        self.message
            .as_ref()
            .and_then(|m| m.chat.username.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    #[serde(default)]
    pub username: Option<String>,
}

/// `sendMessage` request body
#[derive(Debug, Clone, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: &'a str,
    pub text: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineKeyboardMarkup {
    /// Keyboard made of exactly one button
    pub fn single(text: String, callback_data: String) -> Self {
        Self {
            inline_keyboard: vec![vec![InlineKeyboardButton {
                text,
                callback_data,
            }]],
        }
    }
}
