//! `!config [read | key [value]]`

use crate::config::SettingKey;
use crate::state::BotState;

pub async fn run(state: &BotState, args: &[&str]) -> String {
    match args {
        [] | ["read"] => state.settings().await.render(),
        [key, value, ..] => match state.update_setting(key, value).await {
            Ok((key, value)) => format!("Changed config item '{}' to value '{}'", key, value),
            Err(e) => e.to_string(),
        },
        [key] => match key.parse::<SettingKey>() {
            Ok(key) => format!("Config item '{}' is '{}'", key, state.settings().await.get(key)),
            Err(e) => e.to_string(),
        },
    }
}
