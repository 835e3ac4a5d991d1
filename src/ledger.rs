//! Message Counter Ledger
//!
//! Per-author message counts with display aliases. Only authors already in
//! the document are counted; nobody is enrolled automatically.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Day zero for the messages-per-day figure when the document names none
pub fn default_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 3, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    /// author id -> message count
    #[serde(default)]
    pub counts: BTreeMap<String, u64>,
    /// author id -> display name
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epoch: Option<DateTime<Utc>>,
}

/// One line of the ranked listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub name: String,
    pub count: u64,
    /// Messages behind the leader; `None` for the leader
    pub behind: Option<u64>,
}

impl Ledger {
    pub fn is_tracked(&self, author_id: &str) -> bool {
        self.counts.contains_key(author_id)
    }

    /// Add one message for a tracked author. Returns false for untracked authors.
    pub fn increment(&mut self, author_id: &str) -> bool {
        match self.counts.get_mut(author_id) {
            Some(count) => {
                *count += 1;
                true
            }
            None => false,
        }
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn display_name<'a>(&'a self, author_id: &'a str) -> &'a str {
        self.aliases.get(author_id).map(String::as_str).unwrap_or(author_id)
    }

    /// Whole days since the epoch, never less than one
    pub fn elapsed_days(&self, now: DateTime<Utc>) -> i64 {
        let epoch = self.epoch.unwrap_or_else(default_epoch);
        (now - epoch).num_days().max(1)
    }

    /// Authors by count, highest first
    pub fn standings(&self) -> Vec<Standing> {
        let mut ranked: Vec<(&str, u64)> = self
            .counts
            .iter()
            .map(|(id, count)| (self.display_name(id), *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let top = ranked.first().map(|(_, c)| *c).unwrap_or(0);
        ranked
            .into_iter()
            .enumerate()
            .map(|(i, (name, count))| Standing {
                name: name.to_string(),
                count,
                behind: if i == 0 { None } else { Some(top - count) },
            })
            .collect()
    }

    /// Fixed-width report block for `!count`
    pub fn report(&self, now: DateTime<Utc>) -> String {
        let total = self.total();
        let days = self.elapsed_days(now);
        let per_day = total as f64 / days as f64;
        let standings = self.standings();

        let name_width = standings.iter().map(|s| s.name.chars().count()).max().unwrap_or(0);
        let count_width = standings
            .iter()
            .map(|s| s.count.to_string().len())
            .max()
            .unwrap_or(1);

        let mut out = String::from("```\n");
        out.push_str(&format!("Total: {}\n", total));
        out.push_str(&format!("Days: {}\n", days));
        out.push_str(&format!("Per day: {:.2}\n", per_day));
        if !standings.is_empty() {
            out.push('\n');
        }
        for s in &standings {
            let line = format!(
                "{:<nw$}  {:>cw$}",
                s.name,
                s.count,
                nw = name_width,
                cw = count_width
            );
            match s.behind {
                Some(behind) => out.push_str(&format!("{}  (-{})\n", line, behind)),
                None => out.push_str(&format!("{}\n", line)),
            }
        }
        out.push_str("```");
        out
    }
}
