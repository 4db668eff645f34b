//! Inbound webhook payload, reduced to the fields the router uses.

use serde::Deserialize;

/// A text message received from a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub chat_id: i64,
    pub sender_id: u64,
    pub sender_name: String,
    pub sender_handle: Option<String>,
    pub message_id: i32,
    pub text: Option<String>,
}

/// A press on one of the bot's inline buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackQuery {
    pub id: String,
    /// `None` when Telegram no longer exposes the message the button was on.
    pub chat_id: Option<i64>,
    pub message_id: Option<i32>,
    pub sender_id: u64,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundUpdate {
    Message(Message),
    CallbackQuery(CallbackQuery),
}

impl InboundUpdate {
    /// Parse a webhook body. Valid JSON carrying neither a message nor a
    /// callback query yields `Ok(None)`.
    pub fn from_json(body: &[u8]) -> serde_json::Result<Option<Self>> {
        let raw: RawUpdate = serde_json::from_slice(body)?;
        if let Some(message) = raw.message {
            return Ok(Some(InboundUpdate::Message(message.into())));
        }
        Ok(raw
            .callback_query
            .map(|query| InboundUpdate::CallbackQuery(query.into())))
    }
}

#[derive(Debug, Deserialize)]
struct RawUpdate {
    message: Option<RawMessage>,
    callback_query: Option<RawCallbackQuery>,
}

#[derive(Debug, Deserialize)]
struct RawChat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    id: u64,
    first_name: Option<String>,
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    message_id: i32,
    chat: RawChat,
    from: Option<RawUser>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCallbackMessage {
    message_id: i32,
    chat: RawChat,
}

#[derive(Debug, Deserialize)]
struct RawCallbackQuery {
    id: String,
    from: Option<RawUser>,
    message: Option<RawCallbackMessage>,
    data: Option<String>,
}

impl From<RawMessage> for Message {
    fn from(raw: RawMessage) -> Self {
        let (sender_id, sender_name, sender_handle) = match raw.from {
            Some(user) => (
                user.id,
                user.first_name.unwrap_or_else(|| "User".to_string()),
                user.username,
            ),
            None => (0, "User".to_string(), None),
        };
        Self {
            chat_id: raw.chat.id,
            sender_id,
            sender_name,
            sender_handle,
            message_id: raw.message_id,
            text: raw.text,
        }
    }
}

impl From<RawCallbackQuery> for CallbackQuery {
    fn from(raw: RawCallbackQuery) -> Self {
        Self {
            id: raw.id,
            chat_id: raw.message.as_ref().map(|m| m.chat.id),
            message_id: raw.message.as_ref().map(|m| m.message_id),
            sender_id: raw.from.map(|u| u.id).unwrap_or_default(),
            data: raw.data.unwrap_or_default(),
        }
    }
}
