//! Command Dispatch
//!
//! `!verb arg arg ...` is split on single spaces, the verb is resolved
//! through the alias table, and the matching handler produces one reply.
//! Unknown verbs are answered, never raised. A `-?` argument on any known
//! verb answers with that command's help instead of running it.

pub mod changelog;
pub mod config;
pub mod count;
pub mod help;
pub mod latex;
pub mod nhc;
pub mod reaction;
pub mod roll;
pub mod wolfram;

use std::sync::Arc;
use tracing::info;

use crate::scraper::PageFetcher;
use crate::state::BotState;
use crate::wolfram::AnswerLookup;

/// Leading character of every command
pub const COMMAND_MARKER: char = '!';

/// What to send back for a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    /// Nothing to send
    Silent,
}

/// Who issued the command and where
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub author_id: String,
    pub channel_id: String,
}

/// Known commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Config,
    Reaction,
    Roll,
    Wolfram,
    Nhc,
    Count,
    Latex,
    Changelog,
    Help,
    Version,
}

/// Every spelling that reaches each command
static VERB_ALIASES: &[(Verb, &[&str])] = &[
    (Verb::Config, &["config"]),
    (Verb::Reaction, &["reaction"]),
    (Verb::Roll, &["roll"]),
    (Verb::Wolfram, &["w", "wa"]),
    (Verb::Nhc, &["nhc", "noaa"]),
    (Verb::Count, &["count"]),
    (Verb::Latex, &["latex"]),
    (Verb::Changelog, &["changelog"]),
    (Verb::Help, &["help"]),
    (Verb::Version, &["version"]),
];

impl Verb {
    /// Exact, case-sensitive lookup
    pub fn resolve(name: &str) -> Option<Verb> {
        VERB_ALIASES
            .iter()
            .find(|(_, names)| names.iter().any(|n| *n == name))
            .map(|(verb, _)| *verb)
    }
}

/// A command line split into verb and positional arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand<'a> {
    pub verb: &'a str,
    pub args: Vec<&'a str>,
}

/// Split `!verb a b c`. Runs of spaces collapse.
pub fn parse(text: &str) -> ParsedCommand<'_> {
    let body = text.trim().strip_prefix(COMMAND_MARKER).unwrap_or(text.trim());
    let mut tokens = body.split(' ').filter(|t| !t.is_empty());
    let verb = tokens.next().unwrap_or("");
    ParsedCommand {
        verb,
        args: tokens.collect(),
    }
}

/// Routes commands to their handlers
pub struct Dispatcher {
    state: Arc<BotState>,
    fetcher: Arc<dyn PageFetcher>,
    lookup: Arc<dyn AnswerLookup>,
    latex_bot: Option<String>,
}

impl Dispatcher {
    pub fn new(state: Arc<BotState>, fetcher: Arc<dyn PageFetcher>, lookup: Arc<dyn AnswerLookup>) -> Self {
        Self {
            state,
            fetcher,
            lookup,
            latex_bot: None,
        }
    }

    /// User id of the bot that renders `!latex` requests
    pub fn with_latex_bot(mut self, bot_id: Option<String>) -> Self {
        self.latex_bot = bot_id;
        self
    }

    /// Run one command line and produce its reply
    pub async fn dispatch(&self, text: &str, ctx: &CommandContext) -> Reply {
        let ParsedCommand { verb, args } = parse(text);

        let resolved = Verb::resolve(verb);
        let wants_help = args.contains(&"-?");

        let response = match resolved {
            Some(_) if wants_help => help::topic(verb).unwrap_or_else(help::overview),
            Some(Verb::Config) => config::run(&self.state, &args).await,
            Some(Verb::Reaction) => reaction::run(&self.state, &args).await,
            Some(Verb::Roll) => roll::run(&args),
            Some(Verb::Wolfram) => wolfram::run(self.lookup.as_ref(), &args).await,
            Some(Verb::Nhc) => nhc::run(&self.state, self.fetcher.as_ref()).await,
            Some(Verb::Count) => count::run(&self.state, ctx, &args).await,
            Some(Verb::Latex) => latex::run(self.latex_bot.as_deref(), &args),
            Some(Verb::Changelog) => changelog::run(&args),
            Some(Verb::Help) => help::run(&args),
            Some(Verb::Version) => help::version(),
            None => format!("Command \"{}\" not recognized", verb),
        };

        info!(
            verb = verb,
            args = ?args,
            author = %ctx.author_id,
            response = %response,
            "Dispatched command"
        );

        if response.trim().is_empty() {
            Reply::Silent
        } else {
            Reply::Text(response)
        }
    }
}
