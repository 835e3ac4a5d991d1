//! GoogleBot - Entry Point
//!
//! Options:
//! - --json: log as JSON lines on stderr instead of colored text
//! - --help / -h: usage

use std::sync::Arc;

use googlebot::channels::run_discord_bot;
use googlebot::{Bot, BotState, Config, HttpFetcher, JsonStore, WolframClient};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Parse args
    let args: Vec<String> = std::env::args().collect();
    let json_logs = args.iter().any(|a| a == "--json");
    let help_mode = args.iter().any(|a| a == "--help" || a == "-h");

    if help_mode {
        println!("GoogleBot v{}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Usage: googlebot [OPTIONS]");
        println!();
        println!("Options:");
        println!("  --json       Log as JSON lines");
        println!("  --help, -h   Show this help");
        println!();
        println!("Environment variables:");
        println!("  DISCORD_BOT_TOKEN    Discord bot token (required)");
        println!("  WOLFRAM_APP_ID       Wolfram|Alpha app id");
        println!("  BOT_DATA_DIR         Directory for the JSON documents (default: data)");
        println!("  NOTIFY_CHANNEL_ID    Channel for the connection notice");
        println!("  LATEX_BOT_ID         User id of the bot that renders !latex");
        println!("  REACTION_DELAY_MS    Delay between reactions (default: 500)");
        println!("  HTTP_TIMEOUT_SECS    Timeout for web requests (default: 15)");
        return Ok(());
    }

    let log_level = std::env::var("RUST_LOG")
        .map(|s| match s.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        })
        .unwrap_or(Level::INFO);

    if json_logs {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_ansi(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    info!("GoogleBot v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    let state = Arc::new(BotState::load(JsonStore::new(&config.data_dir)).await?);

    let fetcher = Arc::new(HttpFetcher::new(config.http_timeout)?);
    let lookup = WolframClient::new(config.wolfram_app_id.as_deref(), config.http_timeout)?;
    if !lookup.is_available() {
        warn!("WOLFRAM_APP_ID not set, !w and !wa will apologize");
    }

    let bot = Arc::new(
        Bot::new(state, fetcher, Arc::new(lookup), config.reaction_delay).with_latex_bot(config.latex_bot_id),
    );
    run_discord_bot(bot, &config.discord_token, config.notify_channel_id).await
}
