//! Chat Platform Adapters
//!
//! The bot core only sees [`IncomingMessage`] and the [`ChatChannel`] trait.
//! Discord is the one platform wired up.

pub mod discord;
pub mod traits;

pub use discord::{run_discord_bot, DiscordChannel};
pub use traits::{ChannelError, ChatChannel, IncomingMessage};
