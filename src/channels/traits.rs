//! Channel Trait Definitions
//!
//! What the bot needs from a chat platform: incoming messages in a neutral
//! shape, and the ability to send text and add reactions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Error types for channel operations
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Reaction failed: {0}")]
    ReactionFailed(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("Invalid reaction glyph: {0}")]
    InvalidGlyph(String),
}

/// Platform-neutral incoming message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Platform message id
    pub id: String,

    /// Channel the message was posted in
    pub channel_id: String,

    /// Author identifier
    pub author_id: String,

    /// Posted by a bot account (including this one)
    pub author_is_bot: bool,

    /// Message text
    pub content: String,

    /// This bot's user id, set only when the message mentions the bot
    pub bot_mention: Option<String>,
}

impl IncomingMessage {
    /// Create a simple text message from a human author
    pub fn text(author_id: &str, channel_id: &str, content: &str) -> Self {
        Self {
            id: format!("{}-{}", channel_id, chrono::Utc::now().timestamp_micros()),
            channel_id: channel_id.to_string(),
            author_id: author_id.to_string(),
            author_is_bot: false,
            content: content.to_string(),
            bot_mention: None,
        }
    }

    pub fn mentioning_bot(mut self, bot_id: &str) -> Self {
        self.bot_mention = Some(bot_id.to_string());
        self
    }
}

/// Outbound side of a chat platform
#[async_trait]
pub trait ChatChannel: Send + Sync {
    /// Channel name identifier
    fn name(&self) -> &str;

    /// Post text to a channel
    async fn send(&self, channel_id: &str, text: &str) -> Result<(), ChannelError>;

    /// Add one reaction glyph to a message
    async fn react(&self, channel_id: &str, message_id: &str, glyph: &str) -> Result<(), ChannelError>;
}
