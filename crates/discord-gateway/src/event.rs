//! Decoded gateway events.

use serde::{Deserialize, Serialize};

/// A user as it appears in `READY` and message payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub bot: bool,
}

/// `READY` dispatch: the session is established.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyEvent {
    /// The bot's own user.
    pub user: Author,
    #[serde(default)]
    pub session_id: String,
}

/// `MESSAGE_CREATE` dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub channel_id: String,
    #[serde(default)]
    pub guild_id: Option<String>,
    pub author: Author,
    /// Empty unless the message content intent is granted.
    #[serde(default)]
    pub content: String,
}

/// Events surfaced to the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    Ready(ReadyEvent),
    MessageCreate(ChatMessage),
}
