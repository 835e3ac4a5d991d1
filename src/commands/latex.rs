//! `!latex <expression>`
//!
//! Rendering is done by a separate LaTeX bot in the same server; this just
//! hands the expression over by mentioning it.

pub const NOT_CONFIGURED: &str = "LaTeX rendering isn't set up on this server.";

pub fn run(latex_bot: Option<&str>, args: &[&str]) -> String {
    let Some(bot_id) = latex_bot else {
        return NOT_CONFIGURED.to_string();
    };
    if args.is_empty() {
        return "Usage: !latex <expression>".to_string();
    }
    format!("<@!{}> !latex {}", bot_id, args.join(" "))
}
