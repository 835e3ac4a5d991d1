//! GoogleBot
//!
//! Discord chat bot that answers search mentions, runs a handful of `!`
//! commands, and keeps per-term reaction rules and message counters on disk.
//!
//! # Architecture
//!
//! ```text
//! Discord ──► channels::discord ──► Bot::handle
//!                                     │
//!                                     ├── mention ──► scraper (links / images)
//!                                     ├── !command ──► commands::Dispatcher
//!                                     │                  ├── config, reaction, count ──► BotState
//!                                     │                  ├── roll
//!                                     │                  ├── w / wa ──► wolfram
//!                                     │                  └── nhc ──► scraper
//!                                     └── chatter ──► counters, rules, sarcasm
//!
//! BotState ──► JsonStore (config.json, counters.json, reactions.json)
//! ```

pub mod bot;
pub mod channels;
pub mod commands;
pub mod config;
pub mod ledger;
pub mod rules;
pub mod scraper;
pub mod state;
pub mod store;
pub mod wolfram;

pub use bot::Bot;
pub use channels::{ChannelError, ChatChannel, DiscordChannel, IncomingMessage};
pub use commands::{CommandContext, Dispatcher, Reply};
pub use config::{Config, Settings};
pub use ledger::Ledger;
pub use rules::{ReactionRule, RuleBook};
pub use scraper::{HttpFetcher, PageFetcher};
pub use state::BotState;
pub use store::{Document, JsonStore};
pub use wolfram::{AnswerLookup, WolframClient};
