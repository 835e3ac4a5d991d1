//! Reaction Rules
//!
//! Term-triggered reactions evaluated against every non-command message.
//!
//! A rule is keyed by an id handed out by [`RuleBook::create`]. Ids are
//! millisecond timestamps pushed forward when two rules land in the same
//! millisecond, so they stay short enough to type into chat and never collide.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// What a rule does when its term is found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    Emoji,
    Text,
}

impl FromStr for RuleType {
    type Err = RuleEditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "emoji" => Ok(Self::Emoji),
            "text" => Ok(Self::Text),
            other => Err(RuleEditError::InvalidType(other.to_string())),
        }
    }
}

fn default_case_sensitive() -> String {
    "no".to_string()
}

// Older documents hold `null` or other junk in these two fields. A rule with
// an unusable value loads with the default instead of failing the document.

fn case_sensitive_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => default_case_sensitive(),
        other => {
            warn!("Ignoring case_sensitive value {} in stored rule", other);
            default_case_sensitive()
        }
    })
}

fn rule_type_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<RuleType>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => match s.parse() {
            Ok(kind) => Some(kind),
            Err(_) => {
                warn!("Ignoring rule type '{}' in stored rule", s);
                None
            }
        },
        other => {
            warn!("Ignoring rule type {} in stored rule", other);
            None
        }
    })
}

/// A persisted term-to-reaction mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionRule {
    pub term: String,
    #[serde(rename = "type", default, deserialize_with = "rule_type_or_none")]
    pub kind: Option<RuleType>,
    /// Space separated glyphs for emoji rules, reply text for text rules
    #[serde(default)]
    pub reaction: Option<String>,
    /// Only fire for this author when set
    #[serde(default)]
    pub whitelist: Option<String>,
    /// "no" folds case before searching; anything else compares verbatim
    #[serde(default = "default_case_sensitive", deserialize_with = "case_sensitive_or_default")]
    pub case_sensitive: String,
    /// Fields from older documents, written back untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl ReactionRule {
    pub fn new(term: &str) -> Self {
        Self {
            term: term.to_string(),
            kind: None,
            reaction: None,
            whitelist: None,
            case_sensitive: default_case_sensitive(),
            extra: serde_json::Map::new(),
        }
    }

    fn contained_in(&self, text: &str) -> bool {
        if self.case_sensitive == "no" {
            text.to_lowercase().contains(&self.term.to_lowercase())
        } else {
            text.contains(&self.term)
        }
    }

    /// Decide what, if anything, this rule does for a message
    pub fn evaluate(&self, author_id: &str, text: &str) -> Option<RuleAction> {
        if let Some(only) = &self.whitelist {
            if only != author_id {
                return None;
            }
        }

        if self.term.is_empty() || !self.contained_in(text) {
            return None;
        }

        let reaction = self.reaction.as_deref()?;
        match self.kind? {
            RuleType::Emoji => {
                let glyphs: Vec<String> = reaction
                    .split(' ')
                    .filter(|g| !g.is_empty())
                    .map(str::to_string)
                    .collect();
                if glyphs.is_empty() {
                    None
                } else {
                    Some(RuleAction::React(glyphs))
                }
            }
            RuleType::Text if !reaction.is_empty() => Some(RuleAction::Send(reaction.to_string())),
            RuleType::Text => None,
        }
    }
}

/// Side effect requested by a matching rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleAction {
    /// React to the message with each glyph in order
    React(Vec<String>),
    /// Send text to the message's channel
    Send(String),
}

/// Fields that `!reaction set <id> <field> <value>` may touch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleField {
    Term,
    Type,
    Reaction,
    Whitelist,
    CaseSensitive,
}

impl RuleField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Term => "term",
            Self::Type => "type",
            Self::Reaction => "reaction",
            Self::Whitelist => "whitelist",
            Self::CaseSensitive => "case_sensitive",
        }
    }
}

impl FromStr for RuleField {
    type Err = RuleEditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "term" => Ok(Self::Term),
            "type" => Ok(Self::Type),
            "reaction" => Ok(Self::Reaction),
            "whitelist" => Ok(Self::Whitelist),
            "case_sensitive" => Ok(Self::CaseSensitive),
            other => Err(RuleEditError::UnknownField(other.to_string())),
        }
    }
}

impl fmt::Display for RuleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-input errors from rule administration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleEditError {
    #[error("Term '{0}' is already in use by another reaction")]
    TermInUse(String),

    #[error("No reaction with id '{0}' was found")]
    NotFound(String),

    #[error("Type must be 'emoji' or 'text', not '{0}'")]
    InvalidType(String),

    #[error("Field '{0}' is not editable (term, type, reaction, whitelist, case_sensitive)")]
    UnknownField(String),

    #[error("A reaction needs a term")]
    EmptyTerm,
}

/// The full rule table, keyed by id
#[derive(Debug, Clone, Default)]
pub struct RuleBook {
    rules: BTreeMap<String, ReactionRule>,
    last_id: u64,
}

impl RuleBook {
    pub fn from_rules(rules: BTreeMap<String, ReactionRule>) -> Self {
        let last_id = rules.keys().filter_map(|k| k.parse::<u64>().ok()).max().unwrap_or(0);
        Self { rules, last_id }
    }

    pub fn rules(&self) -> &BTreeMap<String, ReactionRule> {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ReactionRule> {
        self.rules.get(id)
    }

    fn next_id(&mut self, now_ms: u64) -> String {
        self.last_id = now_ms.max(self.last_id + 1);
        self.last_id.to_string()
    }

    /// Add a rule for `term`; rejected when another rule already uses it
    pub fn create(&mut self, term: &str, now_ms: u64) -> Result<String, RuleEditError> {
        if term.is_empty() {
            return Err(RuleEditError::EmptyTerm);
        }
        if self.rules.values().any(|r| r.term == term) {
            return Err(RuleEditError::TermInUse(term.to_string()));
        }

        let id = self.next_id(now_ms);
        self.rules.insert(id.clone(), ReactionRule::new(term));
        Ok(id)
    }

    /// Overwrite one field of an existing rule.
    ///
    /// Term edits skip the uniqueness check that creation applies.
    pub fn edit(&mut self, id: &str, field: RuleField, value: &str) -> Result<(), RuleEditError> {
        let rule = self
            .rules
            .get_mut(id)
            .ok_or_else(|| RuleEditError::NotFound(id.to_string()))?;

        match field {
            RuleField::Term => rule.term = value.to_string(),
            RuleField::Type => rule.kind = Some(value.parse()?),
            RuleField::Reaction => rule.reaction = Some(value.to_string()),
            RuleField::Whitelist => {
                rule.whitelist = match value {
                    "null" | "none" => None,
                    author => Some(author.to_string()),
                }
            }
            RuleField::CaseSensitive => rule.case_sensitive = value.to_string(),
        }
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Option<ReactionRule> {
        self.rules.remove(id)
    }

    /// Every action fired by every matching rule, in table order
    pub fn evaluate(&self, author_id: &str, text: &str) -> Vec<RuleAction> {
        self.rules
            .values()
            .filter_map(|rule| rule.evaluate(author_id, text))
            .collect()
    }
}

/// Alternating-case echo for messages ending in `/s` or `\s`
pub fn sarcasm(text: &str) -> Option<String> {
    let trimmed = text.trim();
    let mut tail = trimmed.chars().rev();
    let last = tail.next()?;
    let marker = tail.next()?;
    if !last.eq_ignore_ascii_case(&'s') || !(marker == '/' || marker == '\\') {
        return None;
    }

    let body = trimmed[..trimmed.len() - 2].trim_end();
    if body.is_empty() {
        return None;
    }

    let mut out = String::with_capacity(body.len());
    let mut index = 0usize;
    for c in body.chars() {
        if c.is_alphabetic() {
            if index % 2 == 0 {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            index += 1;
        } else {
            out.push(c);
        }
    }
    Some(out)
}
