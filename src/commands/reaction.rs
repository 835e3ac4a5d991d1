//! `!reaction` rule administration

use crate::rules::RuleField;
use crate::state::BotState;

pub const USAGE: &str = "```\
!reaction                           list every reaction id and term
!reaction show <id>                 show one reaction in full
!reaction set new <term>            create a reaction for <term>
!reaction set <id> <field> <value>  edit one field of a reaction
!reaction remove <id>               delete a reaction
!reaction help                      this text

Fields:
  term            text to look for in messages
  type            emoji | text
  reaction        emoji: space separated emoji, reacted in order
                  text: message sent back to the channel
  whitelist       only react to this user id (null for everyone)
  case_sensitive  yes | no (default no)
```";

pub async fn run(state: &BotState, args: &[&str]) -> String {
    match args.first().copied() {
        Some("help" | "-h" | "--help") => USAGE.to_string(),
        Some("set") => set(state, &args[1..]).await,
        Some("remove") => remove(state, &args[1..]).await,
        Some("show") => show(state, &args[1..]).await,
        _ => list(state).await,
    }
}

async fn set(state: &BotState, args: &[&str]) -> String {
    match args {
        ["new", term @ ..] => {
            let term = term.join(" ");
            match state.create_rule(&term).await {
                Ok(id) => format!("Created reaction {} for term '{}'", id, term),
                Err(e) => e.to_string(),
            }
        }
        [id, field, value @ ..] if !value.is_empty() => {
            let field: RuleField = match field.parse() {
                Ok(field) => field,
                Err(e) => return format!("{}", e),
            };
            let value = value.join(" ");
            match state.edit_rule(id, field, &value).await {
                Ok(()) => format!("Set {} of reaction {} to '{}'", field, id, value),
                Err(e) => e.to_string(),
            }
        }
        _ => "Usage: !reaction set new <term> | !reaction set <id> <field> <value>".to_string(),
    }
}

async fn remove(state: &BotState, args: &[&str]) -> String {
    let Some(id) = args.first() else {
        return "Usage: !reaction remove <id>".to_string();
    };
    match state.remove_rule(id).await {
        Ok(rule) => format!("Removed reaction {} ('{}')", id, rule.term),
        Err(e) => e.to_string(),
    }
}

async fn show(state: &BotState, args: &[&str]) -> String {
    let Some(id) = args.first() else {
        return "Usage: !reaction show <id>".to_string();
    };
    match state.rule(id).await {
        Some(rule) => {
            let mut doc = serde_json::Map::new();
            doc.insert("id".to_string(), serde_json::Value::String(id.to_string()));
            if let Ok(serde_json::Value::Object(fields)) = serde_json::to_value(&rule) {
                doc.extend(fields);
            }
            let body = serde_json::to_string_pretty(&doc).unwrap_or_else(|_| format!("{:?}", rule));
            format!("```json\n{}\n```", body)
        }
        None => format!("No reaction with id '{}' was found", id),
    }
}

async fn list(state: &BotState) -> String {
    let terms = state.rule_terms().await;
    if terms.is_empty() {
        return "No reactions configured. Use `!reaction set new <term>` to add one.".to_string();
    }

    let mut out = String::from("```\n");
    for (id, term) in terms {
        out.push_str(&format!("{}: {}\n", id, term));
    }
    out.push_str("```");
    out
}
