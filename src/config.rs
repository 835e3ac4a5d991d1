//! Configuration management
//!
//! Two layers:
//! - [`Config`]: process configuration read once from the environment
//! - [`Settings`]: the bot configuration document (`config.json`), editable
//!   from chat through `!config`

use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Process configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Discord bot token
    pub discord_token: String,

    /// Wolfram|Alpha app id (lookups fail politely without it)
    pub wolfram_app_id: Option<String>,

    /// Directory holding config.json, counters.json and reactions.json
    pub data_dir: PathBuf,

    /// Channel that receives the connection notice
    pub notify_channel_id: Option<u64>,

    /// User id of the LaTeX rendering bot that `!latex` forwards to
    pub latex_bot_id: Option<u64>,

    /// Delay between sequential reactions on one message
    pub reaction_delay: Duration,

    /// Timeout for scraper and Q&A HTTP calls
    pub http_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let discord_token = std::env::var("DISCORD_BOT_TOKEN")
            .map_err(|_| anyhow::anyhow!("DISCORD_BOT_TOKEN not set"))?;

        let wolfram_app_id = std::env::var("WOLFRAM_APP_ID")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let data_dir = std::env::var("BOT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        let notify_channel_id = std::env::var("NOTIFY_CHANNEL_ID")
            .ok()
            .and_then(|v| v.trim().parse().ok());

        let latex_bot_id = std::env::var("LATEX_BOT_ID")
            .ok()
            .and_then(|v| v.trim().parse().ok());

        let reaction_delay = std::env::var("REACTION_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(500));

        let http_timeout = std::env::var("HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(15));

        Ok(Self {
            discord_token,
            wolfram_app_id,
            data_dir,
            notify_channel_id,
            latex_bot_id,
            reaction_delay,
            http_timeout,
        })
    }
}

/// Bounds for the integer settings
pub const RESULTS_MIN: u8 = 1;
pub const RESULTS_MAX: u8 = 10;

fn default_results() -> u8 {
    3
}

fn default_true() -> bool {
    true
}

fn lenient_results(raw: &serde_json::Value) -> Option<u8> {
    match raw {
        serde_json::Value::Number(n) => n.as_u64().and_then(|n| u8::try_from(n).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_bool(raw: &serde_json::Value) -> Option<bool> {
    match raw {
        serde_json::Value::Bool(b) => Some(*b),
        serde_json::Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Read a stored value, keeping `fallback` when it is unusable
fn stored_or<'de, D, T>(
    deserializer: D,
    parse: fn(&serde_json::Value) -> Option<T>,
    fallback: T,
) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: fmt::Display,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(parse(&raw).unwrap_or_else(|| {
        tracing::warn!("Ignoring stored config value {}, using {}", raw, fallback);
        fallback
    }))
}

fn results_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    stored_or(deserializer, lenient_results, default_results())
}

fn bool_or_false<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    stored_or(deserializer, lenient_bool, false)
}

fn bool_or_true<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    stored_or(deserializer, lenient_bool, true)
}

/// Bot configuration document.
///
/// Keys this build does not know about land in `extra` and are written back
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_results", deserialize_with = "results_or_default")]
    pub text_results: u8,
    #[serde(default = "default_results", deserialize_with = "results_or_default")]
    pub image_results: u8,
    #[serde(default, deserialize_with = "bool_or_false")]
    pub notify_connection: bool,
    #[serde(default, deserialize_with = "bool_or_false")]
    pub debug: bool,
    #[serde(default, deserialize_with = "bool_or_false")]
    pub spam: bool,
    #[serde(default = "default_true", deserialize_with = "bool_or_true")]
    pub reactions: bool,
    #[serde(default = "default_true", deserialize_with = "bool_or_true")]
    pub sarcasm: bool,
    #[serde(default, deserialize_with = "bool_or_false")]
    pub nhc_from_github: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            text_results: default_results(),
            image_results: default_results(),
            notify_connection: false,
            debug: false,
            spam: false,
            reactions: true,
            sarcasm: true,
            nhc_from_github: false,
            extra: serde_json::Map::new(),
        }
    }
}

/// Settings editable through `!config <key> <value>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    TextResults,
    ImageResults,
    NotifyConnection,
    Debug,
    Spam,
    Reactions,
    Sarcasm,
    NhcFromGithub,
}

impl SettingKey {
    pub const ALL: [SettingKey; 8] = [
        SettingKey::TextResults,
        SettingKey::ImageResults,
        SettingKey::NotifyConnection,
        SettingKey::Debug,
        SettingKey::Spam,
        SettingKey::Reactions,
        SettingKey::Sarcasm,
        SettingKey::NhcFromGithub,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextResults => "text_results",
            Self::ImageResults => "image_results",
            Self::NotifyConnection => "notify_connection",
            Self::Debug => "debug",
            Self::Spam => "spam",
            Self::Reactions => "reactions",
            Self::Sarcasm => "sarcasm",
            Self::NhcFromGithub => "nhc_from_github",
        }
    }

    fn is_integer(&self) -> bool {
        matches!(self, Self::TextResults | Self::ImageResults)
    }
}

impl FromStr for SettingKey {
    type Err = SettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| SettingError::UnknownKey(s.to_string()))
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated value ready to be stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingValue {
    Integer(u8),
    Boolean(bool),
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Boolean(v) => write!(f, "{}", v),
        }
    }
}

/// User-input errors from `!config`; the message is sent back verbatim
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingError {
    #[error("Config item '{0}' not recognized")]
    UnknownKey(String),

    #[error("Cannot parse '{value}' for config item '{key}'")]
    NotAnInteger { key: SettingKey, value: String },

    #[error("Value '{value}' for config item '{key}' must be between {min} and {max}")]
    OutOfRange {
        key: SettingKey,
        value: i64,
        min: u8,
        max: u8,
    },

    #[error("Invalid option '{value}' for config item '{key}' (expected true or false)")]
    NotABoolean { key: SettingKey, value: String },
}

impl SettingKey {
    /// Parse a raw chat argument into a value for this key
    pub fn parse_value(&self, raw: &str) -> Result<SettingValue, SettingError> {
        if self.is_integer() {
            let parsed: i64 = raw.trim().parse().map_err(|_| SettingError::NotAnInteger {
                key: *self,
                value: raw.to_string(),
            })?;
            if parsed < RESULTS_MIN as i64 || parsed > RESULTS_MAX as i64 {
                return Err(SettingError::OutOfRange {
                    key: *self,
                    value: parsed,
                    min: RESULTS_MIN,
                    max: RESULTS_MAX,
                });
            }
            return Ok(SettingValue::Integer(parsed as u8));
        }

        match raw.to_ascii_lowercase().as_str() {
            "true" => Ok(SettingValue::Boolean(true)),
            "false" => Ok(SettingValue::Boolean(false)),
            _ => Err(SettingError::NotABoolean {
                key: *self,
                value: raw.to_string(),
            }),
        }
    }
}

impl Settings {
    /// Store an already validated value
    pub fn apply(&mut self, key: SettingKey, value: SettingValue) {
        match (key, value) {
            (SettingKey::TextResults, SettingValue::Integer(v)) => self.text_results = v,
            (SettingKey::ImageResults, SettingValue::Integer(v)) => self.image_results = v,
            (SettingKey::NotifyConnection, SettingValue::Boolean(v)) => self.notify_connection = v,
            (SettingKey::Debug, SettingValue::Boolean(v)) => self.debug = v,
            (SettingKey::Spam, SettingValue::Boolean(v)) => self.spam = v,
            (SettingKey::Reactions, SettingValue::Boolean(v)) => self.reactions = v,
            (SettingKey::Sarcasm, SettingValue::Boolean(v)) => self.sarcasm = v,
            (SettingKey::NhcFromGithub, SettingValue::Boolean(v)) => self.nhc_from_github = v,
            (key, value) => {
                tracing::warn!("Ignoring mismatched value {} for {}", value, key);
            }
        }
    }

    /// Read back a value by key
    pub fn get(&self, key: SettingKey) -> SettingValue {
        match key {
            SettingKey::TextResults => SettingValue::Integer(self.text_results),
            SettingKey::ImageResults => SettingValue::Integer(self.image_results),
            SettingKey::NotifyConnection => SettingValue::Boolean(self.notify_connection),
            SettingKey::Debug => SettingValue::Boolean(self.debug),
            SettingKey::Spam => SettingValue::Boolean(self.spam),
            SettingKey::Reactions => SettingValue::Boolean(self.reactions),
            SettingKey::Sarcasm => SettingValue::Boolean(self.sarcasm),
            SettingKey::NhcFromGithub => SettingValue::Boolean(self.nhc_from_github),
        }
    }

    /// Result counts clamped into range, for documents edited by hand
    pub fn text_results(&self) -> usize {
        self.text_results.clamp(RESULTS_MIN, RESULTS_MAX) as usize
    }

    pub fn image_results(&self) -> usize {
        self.image_results.clamp(RESULTS_MIN, RESULTS_MAX) as usize
    }

    /// Render the whole document for `!config` with no arguments
    pub fn render(&self) -> String {
        let body = serde_json::to_string_pretty(self).unwrap_or_else(|_| format!("{:?}", self));
        format!("```Current config values\n{}```", body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_bounds() {
        let key = SettingKey::TextResults;
        assert_eq!(key.parse_value("1"), Ok(SettingValue::Integer(1)));
        assert_eq!(key.parse_value("10"), Ok(SettingValue::Integer(10)));
        assert!(matches!(key.parse_value("0"), Err(SettingError::OutOfRange { .. })));
        assert!(matches!(key.parse_value("11"), Err(SettingError::OutOfRange { .. })));
        assert!(matches!(key.parse_value("ten"), Err(SettingError::NotAnInteger { .. })));
    }

    #[test]
    fn test_boolean_is_case_insensitive() {
        let key = SettingKey::Spam;
        assert_eq!(key.parse_value("TRUE"), Ok(SettingValue::Boolean(true)));
        assert_eq!(key.parse_value("False"), Ok(SettingValue::Boolean(false)));
        assert!(matches!(key.parse_value("yes"), Err(SettingError::NotABoolean { .. })));
    }

    #[test]
    fn test_unknown_key() {
        let err = "colour".parse::<SettingKey>().unwrap_err();
        assert_eq!(err.to_string(), "Config item 'colour' not recognized");
    }

    #[test]
    fn test_unknown_document_keys_round_trip() {
        let raw = r#"{"text_results":4,"memeSubreddit":"okbuddyretard","shortHate":true}"#;
        let settings: Settings = serde_json::from_str(raw).unwrap();
        assert_eq!(settings.text_results, 4);
        assert_eq!(settings.image_results, 3);
        assert!(settings.reactions);

        let written = serde_json::to_value(&settings).unwrap();
        assert_eq!(written["memeSubreddit"], "okbuddyretard");
        assert_eq!(written["shortHate"], true);
    }

    #[test]
    fn test_unusable_stored_values_fall_back() {
        let raw = r#"{"text_results":-1,"image_results":"5","spam":"TRUE","sarcasm":null,"debug":7}"#;
        let settings: Settings = serde_json::from_str(raw).unwrap();
        assert_eq!(settings.text_results, 3);
        assert_eq!(settings.image_results, 5);
        assert!(settings.spam);
        assert!(settings.sarcasm);
        assert!(!settings.debug);
    }

    #[test]
    fn test_apply_and_get() {
        let mut settings = Settings::default();
        settings.apply(SettingKey::ImageResults, SettingValue::Integer(7));
        settings.apply(SettingKey::Debug, SettingValue::Boolean(true));
        assert_eq!(settings.get(SettingKey::ImageResults), SettingValue::Integer(7));
        assert_eq!(settings.get(SettingKey::Debug), SettingValue::Boolean(true));
    }
}
