//! Discord Channel Implementation
//!
//! Gateway events arrive through serenity; every event is handled in its own
//! task, so one slow lookup never holds up other messages.
//!
//! # Configuration
//!
//! Environment variables:
//! - `DISCORD_BOT_TOKEN`: Discord bot token
//! - `NOTIFY_CHANNEL_ID`: channel told `Connected` on startup (optional)

use anyhow::Result;
use async_trait::async_trait;
use serenity::all::{
    ChannelId, Client, Context, EventHandler, GatewayIntents, Http, Message, MessageId, ReactionType,
    Ready,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::traits::*;
use crate::bot::Bot;

/// Discord limit per message
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Outbound Discord calls over the REST client
pub struct DiscordChannel {
    http: Arc<Http>,
    max_message_length: usize,
}

impl DiscordChannel {
    pub fn new(http: Arc<Http>) -> Self {
        Self {
            http,
            max_message_length: MAX_MESSAGE_LENGTH,
        }
    }

    fn parse_id(raw: &str) -> Result<u64, ChannelError> {
        raw.parse::<u64>()
            .ok()
            .filter(|id| *id != 0)
            .ok_or_else(|| ChannelError::InvalidRecipient(raw.to_string()))
    }
}

/// Split long messages at line boundaries, keeping code fences balanced
pub fn split_message(content: &str, max_len: usize) -> Vec<String> {
    if content.len() <= max_len {
        return vec![content.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let code_block_pattern = "```";
    // Room for a closing fence on every chunk
    let budget = max_len.saturating_sub(4).max(1);

    for line in content.lines() {
        for piece in split_line(line, max_len.saturating_sub(8).max(1)) {
            if current.len() + piece.len() + 1 > budget {
                let open_blocks = current.matches(code_block_pattern).count();
                if open_blocks % 2 == 1 {
                    current.push_str("\n```");
                }

                if !current.is_empty() {
                    chunks.push(std::mem::take(&mut current));
                }

                if open_blocks % 2 == 1 {
                    current.push_str("```\n");
                }

                current.push_str(piece);
            } else {
                if !current.is_empty() {
                    current.push('\n');
                }
                current.push_str(piece);
            }
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Hard-split a single over-long line on char boundaries
fn split_line(line: &str, max_len: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = line;
    while rest.len() > max_len {
        let mut cut = max_len;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        if cut == 0 {
            // Limit narrower than one char: take the whole char anyway
            cut = rest.chars().next().map_or(rest.len(), char::len_utf8);
        }
        let (head, tail) = rest.split_at(cut);
        pieces.push(head);
        rest = tail;
    }
    if !rest.is_empty() || pieces.is_empty() {
        pieces.push(rest);
    }
    pieces
}

#[async_trait]
impl ChatChannel for DiscordChannel {
    fn name(&self) -> &str {
        "discord"
    }

    async fn send(&self, channel_id: &str, text: &str) -> Result<(), ChannelError> {
        let channel = ChannelId::new(Self::parse_id(channel_id)?);
        let chunks = split_message(text, self.max_message_length);

        for (i, chunk) in chunks.iter().enumerate() {
            channel
                .say(&self.http, chunk)
                .await
                .map_err(|e| ChannelError::SendFailed(e.to_string()))?;

            // Respect rate limits
            if i < chunks.len() - 1 {
                tokio::time::sleep(tokio::time::Duration::from_millis(250)).await;
            }
        }

        Ok(())
    }

    async fn react(&self, channel_id: &str, message_id: &str, glyph: &str) -> Result<(), ChannelError> {
        let channel = ChannelId::new(Self::parse_id(channel_id)?);
        let message = MessageId::new(Self::parse_id(message_id)?);
        let reaction = ReactionType::try_from(glyph)
            .map_err(|_| ChannelError::InvalidGlyph(glyph.to_string()))?;

        self.http
            .create_reaction(channel, message, &reaction)
            .await
            .map_err(|e| ChannelError::ReactionFailed(e.to_string()))
    }
}

/// Convert a gateway message into the neutral shape
fn to_incoming(ctx: &Context, msg: &Message) -> IncomingMessage {
    let me = ctx.cache.current_user().id;
    IncomingMessage {
        id: msg.id.get().to_string(),
        channel_id: msg.channel_id.get().to_string(),
        author_id: msg.author.id.get().to_string(),
        author_is_bot: msg.author.bot,
        content: msg.content.clone(),
        bot_mention: msg
            .mentions
            .iter()
            .any(|u| u.id == me)
            .then(|| me.get().to_string()),
    }
}

struct Handler {
    bot: Arc<Bot>,
    notify_channel_id: Option<u64>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            "Connected as {} (id {}) on {}",
            ready.user.name,
            ready.user.id,
            chrono::Utc::now().to_rfc2822()
        );

        if !self.bot.state().settings().await.notify_connection {
            return;
        }
        if let Some(channel_id) = self.notify_channel_id {
            let channel = DiscordChannel::new(ctx.http.clone());
            if let Err(e) = channel.send(&channel_id.to_string(), "Connected").await {
                warn!("Failed to send connection notice: {}", e);
            }
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        let incoming = to_incoming(&ctx, &msg);
        debug!(
            ">>> Message received: author={}, channel={}, text={:?}",
            incoming.author_id,
            incoming.channel_id,
            incoming.content.chars().take(50).collect::<String>()
        );

        let channel: Arc<dyn ChatChannel> = Arc::new(DiscordChannel::new(ctx.http.clone()));
        self.bot.handle(&incoming, channel).await;
    }
}

/// Connect to the gateway and serve until interrupted
pub async fn run_discord_bot(bot: Arc<Bot>, token: &str, notify_channel_id: Option<u64>) -> Result<()> {
    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let handler = Handler {
        bot,
        notify_channel_id,
    };

    let mut client = Client::builder(token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to build Discord client: {}", e))?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down");
            shard_manager.shutdown_all().await;
        }
    });

    info!("Starting gateway connection...");
    if let Err(e) = client.start().await {
        error!("Discord client stopped: {}", e);
        anyhow::bail!("Discord client error: {}", e);
    }

    warn!("Gateway stopped");
    Ok(())
}
