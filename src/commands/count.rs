//! `!count [reload]`

use chrono::Utc;
use tracing::warn;

use super::CommandContext;
use crate::state::BotState;

pub async fn run(state: &BotState, ctx: &CommandContext, args: &[&str]) -> String {
    if args.first() == Some(&"reload") {
        if let Err(e) = state.reload_ledger().await {
            warn!("Counter reload failed, reporting from memory: {}", e);
        }
    }

    state.count_and_report(&ctx.author_id, Utc::now()).await
}
