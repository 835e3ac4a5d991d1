//! Shared Bot State
//!
//! Single owner of the three persisted documents. Every mutation goes through
//! a method here, runs under the document's lock and writes the whole
//! document back before the lock is released, so concurrent messages never
//! interleave a read-modify-write on the same file.
//!
//! Write failures are logged and swallowed; memory stays authoritative until
//! the next successful write.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info};

use crate::config::{SettingError, SettingKey, SettingValue, Settings};
use crate::ledger::Ledger;
use crate::rules::{ReactionRule, RuleAction, RuleBook, RuleEditError, RuleField};
use crate::store::{Document, JsonStore, StoreError};

pub struct BotState {
    store: JsonStore,
    settings: RwLock<Settings>,
    rules: Mutex<RuleBook>,
    ledger: Mutex<Ledger>,
}

impl BotState {
    /// Load all documents from the store. Missing documents start empty, and
    /// so do documents too damaged to parse (the damaged file is kept aside).
    pub async fn load(store: JsonStore) -> Result<Self, StoreError> {
        let settings: Settings = store.read_or_recover(Document::Config).await?;
        let rules: BTreeMap<String, ReactionRule> = store.read_or_recover(Document::Reactions).await?;
        let ledger: Ledger = store.read_or_recover(Document::Counters).await?;

        info!(
            "Loaded state from {}: {} reaction rules, {} tracked authors",
            store.dir().display(),
            rules.len(),
            ledger.counts.len()
        );

        Ok(Self {
            store,
            settings: RwLock::new(settings),
            rules: Mutex::new(RuleBook::from_rules(rules)),
            ledger: Mutex::new(ledger),
        })
    }

    /// Build state in memory, for tests and first runs
    pub fn with_documents(store: JsonStore, settings: Settings, rules: RuleBook, ledger: Ledger) -> Self {
        Self {
            store,
            settings: RwLock::new(settings),
            rules: Mutex::new(rules),
            ledger: Mutex::new(ledger),
        }
    }

    async fn persist<T: serde::Serialize>(&self, doc: Document, value: &T) {
        if let Err(e) = self.store.write_json(doc, value).await {
            error!("Failed to persist {}: {}", doc.file_name(), e);
        }
    }

    // --- settings ---

    pub async fn settings(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Validate, apply and persist one configuration change
    pub async fn update_setting(&self, key: &str, raw: &str) -> Result<(SettingKey, SettingValue), SettingError> {
        let key: SettingKey = key.parse()?;
        let value = key.parse_value(raw)?;

        let mut settings = self.settings.write().await;
        settings.apply(key, value);
        self.persist(Document::Config, &*settings).await;
        Ok((key, value))
    }

    // --- reaction rules ---

    pub async fn create_rule(&self, term: &str) -> Result<String, RuleEditError> {
        let mut book = self.rules.lock().await;
        let id = book.create(term, Utc::now().timestamp_millis().max(0) as u64)?;
        self.persist(Document::Reactions, book.rules()).await;
        Ok(id)
    }

    pub async fn edit_rule(&self, id: &str, field: RuleField, value: &str) -> Result<(), RuleEditError> {
        let mut book = self.rules.lock().await;
        book.edit(id, field, value)?;
        self.persist(Document::Reactions, book.rules()).await;
        Ok(())
    }

    pub async fn remove_rule(&self, id: &str) -> Result<ReactionRule, RuleEditError> {
        let mut book = self.rules.lock().await;
        let removed = book
            .remove(id)
            .ok_or_else(|| RuleEditError::NotFound(id.to_string()))?;
        self.persist(Document::Reactions, book.rules()).await;
        Ok(removed)
    }

    pub async fn rule(&self, id: &str) -> Option<ReactionRule> {
        self.rules.lock().await.get(id).cloned()
    }

    /// (id, term) pairs in table order
    pub async fn rule_terms(&self) -> Vec<(String, String)> {
        self.rules
            .lock()
            .await
            .rules()
            .iter()
            .map(|(id, rule)| (id.clone(), rule.term.clone()))
            .collect()
    }

    pub async fn rule_count(&self) -> usize {
        self.rules.lock().await.len()
    }

    pub async fn match_rules(&self, author_id: &str, text: &str) -> Vec<RuleAction> {
        self.rules.lock().await.evaluate(author_id, text)
    }

    // --- counters ---

    /// Count one message for a tracked author
    pub async fn count_message(&self, author_id: &str) -> bool {
        let mut ledger = self.ledger.lock().await;
        if !ledger.increment(author_id) {
            return false;
        }
        self.persist(Document::Counters, &*ledger).await;
        true
    }

    /// Replace the in-memory ledger with the stored document
    pub async fn reload_ledger(&self) -> Result<(), StoreError> {
        let fresh: Ledger = self.store.read_or_default(Document::Counters).await?;
        *self.ledger.lock().await = fresh;
        info!("Reloaded counters from store");
        Ok(())
    }

    /// Count the requester, then report on the updated ledger
    pub async fn count_and_report(&self, author_id: &str, now: DateTime<Utc>) -> String {
        let mut ledger = self.ledger.lock().await;
        if ledger.increment(author_id) {
            self.persist(Document::Counters, &*ledger).await;
        }
        ledger.report(now)
    }

    pub async fn ledger(&self) -> Ledger {
        self.ledger.lock().await.clone()
    }
}
