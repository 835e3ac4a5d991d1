//! Shared fakes for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use googlebot::channels::{ChannelError, ChatChannel};
use googlebot::scraper::{PageFetcher, ScrapeError};
use googlebot::wolfram::{AnswerLookup, LookupError};
use googlebot::{Bot, BotState, JsonStore};
use tempfile::TempDir;

/// Records everything the bot sends or reacts with
#[derive(Default)]
pub struct RecordingChannel {
    pub sent: Mutex<Vec<(String, String)>>,
    pub reactions: Mutex<Vec<(String, String)>>,
}

impl RecordingChannel {
    pub fn sent_texts(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
    }

    pub fn glyphs(&self) -> Vec<String> {
        self.reactions.lock().unwrap().iter().map(|(_, g)| g.clone()).collect()
    }
}

#[async_trait]
impl ChatChannel for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, channel_id: &str, text: &str) -> Result<(), ChannelError> {
        self.sent
            .lock()
            .unwrap()
            .push((channel_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn react(&self, _channel_id: &str, message_id: &str, glyph: &str) -> Result<(), ChannelError> {
        self.reactions
            .lock()
            .unwrap()
            .push((message_id.to_string(), glyph.to_string()));
        Ok(())
    }
}

/// Serves canned pages by exact URL; anything else is a 404
#[derive(Default)]
pub struct StaticFetcher {
    pages: HashMap<String, String>,
}

impl StaticFetcher {
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        self.pages.get(url).cloned().ok_or(ScrapeError::Status(404))
    }
}

/// Answers every query the same way, or fails every query
pub struct CannedLookup {
    pub answer: Option<String>,
}

#[async_trait]
impl AnswerLookup for CannedLookup {
    async fn short_answer(&self, _query: &str) -> Result<String, LookupError> {
        self.answer.clone().ok_or(LookupError::NoAnswer)
    }

    async fn simple_answer(&self, _query: &str) -> Result<String, LookupError> {
        self.answer
            .as_ref()
            .map(|a| format!("https://img.example/{}", a))
            .ok_or(LookupError::NoAnswer)
    }
}

pub async fn create_test_state() -> (Arc<BotState>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let state = BotState::load(JsonStore::new(temp_dir.path()))
        .await
        .expect("Failed to load state");
    (Arc::new(state), temp_dir)
}

pub fn create_test_bot(state: Arc<BotState>, fetcher: StaticFetcher, answer: Option<&str>) -> Bot {
    Bot::new(
        state,
        Arc::new(fetcher),
        Arc::new(CannedLookup {
            answer: answer.map(String::from),
        }),
        Duration::from_millis(1),
    )
}
