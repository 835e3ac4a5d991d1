//! `!w` / `!wa [image] <query>`

use tracing::warn;

use crate::wolfram::AnswerLookup;

pub const NOT_UNDERSTOOD: &str = "Sorry, I don't understand your query.";

pub async fn run(lookup: &dyn AnswerLookup, args: &[&str]) -> String {
    let (image, rest) = match args.split_first() {
        Some((&"image", rest)) => (true, rest),
        _ => (false, args),
    };

    let query = rest.join(" ");
    if query.is_empty() {
        return NOT_UNDERSTOOD.to_string();
    }

    let answer = if image {
        lookup.simple_answer(&query).await
    } else {
        lookup.short_answer(&query).await
    };

    answer.unwrap_or_else(|e| {
        warn!("Lookup for {:?} failed: {}", query, e);
        NOT_UNDERSTOOD.to_string()
    })
}
