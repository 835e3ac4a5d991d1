//! Message Handling
//!
//! Entry point for every inbound chat message. A message is routed to exactly
//! one of three paths: a mention becomes a search (or a command, when the
//! mention is followed by `!`), a `!` prefix becomes a command, and anything
//! else is chatter that feeds the counters, the canned replies, the reaction
//! rules and the sarcasm transform.

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::channels::{ChatChannel, IncomingMessage};
use crate::commands::{CommandContext, Dispatcher, Reply, COMMAND_MARKER};
use crate::rules::{self, RuleAction};
use crate::scraper::{self, PageFetcher};
use crate::state::BotState;
use crate::wolfram::AnswerLookup;

static MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"<@!?(\d+)>").unwrap());

/// Fixed replies sent when the `spam` setting is on
const CANNED_REPLIES: &[(&str, &str)] = &[("How was your run?", "I just got back from my run"), ("69", "Nice")];

pub const NO_RESULTS: &str = "Sorry, I couldn't find anything for that.";
pub const SEARCH_FAILED: &str = "Sorry, the search didn't work. Try again later.";
pub const MENTION_USAGE: &str =
    "Mention me with something to search for, `images <query>` for pictures, or a `!` command.";

/// What a mention asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MentionRequest {
    Command(String),
    Images { query: String, plural: bool },
    Links(String),
    /// Nothing left once the mention is removed
    Empty,
}

/// Classify the text of a message addressed to the bot. Only the bot's own
/// mention is removed; other mentions stay part of the query.
pub fn classify_mention(content: &str, bot_id: &str) -> MentionRequest {
    let text = MENTION.replace_all(content, |caps: &regex::Captures| {
        if &caps[1] == bot_id {
            String::new()
        } else {
            caps[0].to_string()
        }
    });
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if text.is_empty() {
        return MentionRequest::Empty;
    }
    if text.starts_with(COMMAND_MARKER) {
        return MentionRequest::Command(text);
    }

    let (first, rest) = match text.split_once(' ') {
        Some((first, rest)) => (first, rest.trim()),
        None => (text.as_str(), ""),
    };
    match first.to_lowercase().as_str() {
        word @ ("image" | "images" | "picture" | "pictures") => {
            let query = rest.strip_prefix("of ").unwrap_or(rest).trim().to_string();
            MentionRequest::Images {
                query,
                plural: word.ends_with('s'),
            }
        }
        _ => MentionRequest::Links(text.clone()),
    }
}

pub struct Bot {
    state: Arc<BotState>,
    dispatcher: Dispatcher,
    fetcher: Arc<dyn PageFetcher>,
    reaction_delay: Duration,
}

impl Bot {
    pub fn new(
        state: Arc<BotState>,
        fetcher: Arc<dyn PageFetcher>,
        lookup: Arc<dyn AnswerLookup>,
        reaction_delay: Duration,
    ) -> Self {
        let dispatcher = Dispatcher::new(state.clone(), fetcher.clone(), lookup);
        Self {
            state,
            dispatcher,
            fetcher,
            reaction_delay,
        }
    }

    /// Forward `!latex` to the bot with this user id
    pub fn with_latex_bot(mut self, bot_id: Option<u64>) -> Self {
        self.dispatcher = self.dispatcher.with_latex_bot(bot_id.map(|id| id.to_string()));
        self
    }

    pub fn state(&self) -> &Arc<BotState> {
        &self.state
    }

    /// Handle one inbound message to completion
    pub async fn handle(&self, msg: &IncomingMessage, channel: Arc<dyn ChatChannel>) {
        if msg.author_is_bot {
            return;
        }

        let content = msg.content.replace('\u{2019}', "");
        let ctx = CommandContext {
            author_id: msg.author_id.clone(),
            channel_id: msg.channel_id.clone(),
        };

        if let Some(bot_id) = &msg.bot_mention {
            match classify_mention(&content, bot_id) {
                MentionRequest::Command(line) => self.run_command(&line, &ctx, channel.as_ref()).await,
                MentionRequest::Images { query, plural } => {
                    let limit = if plural {
                        self.state.settings().await.image_results()
                    } else {
                        1
                    };
                    let result = scraper::image_search(self.fetcher.as_ref(), &query, limit).await;
                    self.send_search_result(result, &ctx, channel.as_ref()).await;
                }
                MentionRequest::Links(query) => {
                    let limit = self.state.settings().await.text_results();
                    let result = scraper::link_search(self.fetcher.as_ref(), &query, limit).await;
                    self.send_search_result(result, &ctx, channel.as_ref()).await;
                }
                MentionRequest::Empty => send_or_warn(channel.as_ref(), &ctx.channel_id, MENTION_USAGE).await,
            }
            return;
        }

        if content.starts_with(COMMAND_MARKER) {
            self.run_command(&content, &ctx, channel.as_ref()).await;
            return;
        }

        self.handle_chatter(msg, &content, channel).await;
    }

    async fn run_command(&self, line: &str, ctx: &CommandContext, channel: &dyn ChatChannel) {
        if let Reply::Text(text) = self.dispatcher.dispatch(line, ctx).await {
            send_or_warn(channel, &ctx.channel_id, &text).await;
        }
    }

    async fn send_search_result(
        &self,
        result: Result<Vec<String>, scraper::ScrapeError>,
        ctx: &CommandContext,
        channel: &dyn ChatChannel,
    ) {
        let reply = match result {
            Ok(links) if links.is_empty() => NO_RESULTS.to_string(),
            Ok(links) => links.join("\n"),
            Err(e) => {
                warn!("Search failed: {}", e);
                SEARCH_FAILED.to_string()
            }
        };
        send_or_warn(channel, &ctx.channel_id, &reply).await;
    }

    async fn handle_chatter(&self, msg: &IncomingMessage, content: &str, channel: Arc<dyn ChatChannel>) {
        let settings = self.state.settings().await;
        let mut fired = false;

        if self.state.count_message(&msg.author_id).await {
            debug!("Counted message from {}", msg.author_id);
        }

        if settings.spam {
            for (trigger, reply) in CANNED_REPLIES {
                if content.trim() == *trigger {
                    send_or_warn(channel.as_ref(), &msg.channel_id, reply).await;
                    fired = true;
                }
            }
        }

        if settings.reactions {
            for action in self.state.match_rules(&msg.author_id, content).await {
                fired = true;
                self.apply(action, msg, channel.clone()).await;
            }
        }

        if settings.sarcasm {
            if let Some(mocked) = rules::sarcasm(content) {
                fired = true;
                send_or_warn(channel.as_ref(), &msg.channel_id, &mocked).await;
            }
        }

        if !fired && settings.debug {
            debug!("No rule matched message {} from {}", msg.id, msg.author_id);
        }
    }

    async fn apply(&self, action: RuleAction, msg: &IncomingMessage, channel: Arc<dyn ChatChannel>) {
        match action {
            RuleAction::Send(text) => send_or_warn(channel.as_ref(), &msg.channel_id, &text).await,
            RuleAction::React(glyphs) if glyphs.len() == 1 => {
                if let Err(e) = channel.react(&msg.channel_id, &msg.id, &glyphs[0]).await {
                    warn!("Reaction {} failed: {}", glyphs[0], e);
                }
            }
            RuleAction::React(glyphs) => {
                // Spaced out so they land in order; later rules do not wait
                let channel_id = msg.channel_id.clone();
                let message_id = msg.id.clone();
                let delay = self.reaction_delay;
                info!("Reacting with {} glyphs to {}", glyphs.len(), message_id);
                tokio::spawn(async move {
                    for (i, glyph) in glyphs.iter().enumerate() {
                        if i > 0 {
                            tokio::time::sleep(delay).await;
                        }
                        if let Err(e) = channel.react(&channel_id, &message_id, glyph).await {
                            warn!("Reaction {} failed: {}", glyph, e);
                        }
                    }
                });
            }
        }
    }
}

async fn send_or_warn(channel: &dyn ChatChannel, channel_id: &str, text: &str) {
    if let Err(e) = channel.send(channel_id, text).await {
        warn!("Failed to send on {} to {}: {}", channel.name(), channel_id, e);
    }
}
