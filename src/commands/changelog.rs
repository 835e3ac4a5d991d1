//! `!changelog [-f]`

const CHANGELOG: &str = include_str!("../../CHANGELOG.txt");

/// First version block: the opening `v` line and everything up to the next one
pub fn latest(changelog: &str) -> String {
    let mut lines = changelog.lines();
    let mut block: Vec<&str> = lines.next().into_iter().collect();
    block.extend(lines.take_while(|line| !line.starts_with('v')));
    block.join("\n")
}

pub fn run(args: &[&str]) -> String {
    let full = args.iter().any(|a| *a == "-f" || *a == "-full");
    let body = if full {
        CHANGELOG.trim_end().to_string()
    } else {
        latest(CHANGELOG)
    };
    format!("```\n{}\n```", body)
}
