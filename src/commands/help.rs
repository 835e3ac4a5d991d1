//! `!help [topic]`, `!version`, and the `-?` text of every command

use super::reaction;

pub fn overview() -> String {
    "```\
Mention me with a question and I'll search for it.
Mention me with 'image(s) <query>' or 'picture(s) <query>' for pictures.

!config [read | key [value]]   show or change settings
!reaction ...                  manage reactions (!reaction help)
!roll [sides]                  roll a die (default 6)
!w | !wa [image] <query>       ask Wolfram|Alpha
!nhc | !noaa                   Atlantic tropical outlook
!count [reload]                message leaderboard
!latex <expression>            render with the LaTeX bot
!changelog [-f]                latest changes, or all of them
!version                       bot version
!help [topic]                  this text, or help for one command

Add -? to any command for its help.
```"
    .to_string()
}

pub fn version() -> String {
    format!("```GoogleBot v{}```", env!("CARGO_PKG_VERSION"))
}

/// Help text for one command, by any of its names
pub fn topic(name: &str) -> Option<String> {
    let text = match name.trim_start_matches('!') {
        "config" => {
            "!config                 show every setting\n\
             !config read            same as above\n\
             !config <key>           show one setting\n\
             !config <key> <value>   change a setting\n\n\
             text_results, image_results   1 to 10\n\
             notify_connection, debug, spam, reactions, sarcasm, nhc_from_github   true | false"
        }
        "reaction" => return Some(reaction::USAGE.to_string()),
        "roll" => {
            "!roll            roll a 6-sided die\n\
             !roll <sides>    roll a die with that many sides (at least 2)"
        }
        "w" | "wa" => {
            "!w <query>         short answer from Wolfram|Alpha\n\
             !w image <query>   picture of the full answer"
        }
        "nhc" | "noaa" => "!nhc    current Atlantic tropical weather outlook map",
        "count" => {
            "!count          message leaderboard (counts your message too)\n\
             !count reload   re-read the counters file first"
        }
        "latex" => "!latex <expression>   ask the LaTeX bot to render an expression",
        "changelog" => {
            "!changelog      changes in the current version\n\
             !changelog -f   the full changelog"
        }
        "version" => "!version   running bot version",
        "help" => {
            "!help           list every command\n\
             !help <topic>   help for one command\n\
             !<command> -?   same as !help <command>"
        }
        _ => return None,
    };
    Some(format!("```\n{}\n```", text))
}

pub fn run(args: &[&str]) -> String {
    match args.first() {
        None => overview(),
        Some(name) => {
            topic(name).unwrap_or_else(|| format!("No help for '{}'. Try !help for the list of commands.", name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topics_by_alias() {
        assert_eq!(topic("w"), topic("wa"));
        assert_eq!(topic("!noaa"), topic("nhc"));
        assert!(topic("roll").unwrap().contains("at least 2"));
        assert!(topic("bogus").is_none());
    }

    #[test]
    fn test_run() {
        assert!(run(&[]).contains("!changelog"));
        assert!(run(&["count"]).contains("reload"));
        assert!(run(&["bogus"]).starts_with("No help for 'bogus'"));
    }
}
