//! Message Handling Integration Tests
//!
//! Feeds `IncomingMessage`s through `Bot::handle` and inspects what the
//! recording channel saw.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{create_test_bot, create_test_state, RecordingChannel, StaticFetcher};
use googlebot::bot::{MENTION_USAGE, NO_RESULTS, SEARCH_FAILED};
use googlebot::channels::{ChatChannel, IncomingMessage};
use googlebot::rules::RuleField;
use googlebot::scraper::search_url;
use googlebot::store::{Document, JsonStore};
use googlebot::{BotState, Ledger};
use tempfile::TempDir;

fn recorder() -> (Arc<RecordingChannel>, Arc<dyn ChatChannel>) {
    let recording = Arc::new(RecordingChannel::default());
    let channel: Arc<dyn ChatChannel> = recording.clone();
    (recording, channel)
}

#[tokio::test]
async fn test_text_rule_fires_for_anyone() {
    let (state, _temp) = create_test_state().await;
    let id = state.create_rule("cat").await.unwrap();
    state.edit_rule(&id, RuleField::Type, "text").await.unwrap();
    state.edit_rule(&id, RuleField::Reaction, "meow").await.unwrap();
    let bot = create_test_bot(state, StaticFetcher::default(), None);

    for author in ["U1", "U2"] {
        let (recording, channel) = recorder();
        bot.handle(&IncomingMessage::text(author, "C1", "I have a CAT"), channel)
            .await;
        assert_eq!(recording.sent_texts(), vec!["meow".to_string()]);
    }
}

#[tokio::test]
async fn test_whitelist_limits_author() {
    let (state, _temp) = create_test_state().await;
    let id = state.create_rule("cat").await.unwrap();
    state.edit_rule(&id, RuleField::Type, "text").await.unwrap();
    state.edit_rule(&id, RuleField::Reaction, "meow").await.unwrap();
    state.edit_rule(&id, RuleField::Whitelist, "U1").await.unwrap();
    let bot = create_test_bot(state.clone(), StaticFetcher::default(), None);

    let (recording, channel) = recorder();
    bot.handle(&IncomingMessage::text("U2", "C1", "my cat"), channel).await;
    assert!(recording.sent_texts().is_empty());

    let (recording, channel) = recorder();
    bot.handle(&IncomingMessage::text("U1", "C1", "my cat"), channel).await;
    assert_eq!(recording.sent_texts(), vec!["meow".to_string()]);

    state.edit_rule(&id, RuleField::Whitelist, "null").await.unwrap();
    let (recording, channel) = recorder();
    bot.handle(&IncomingMessage::text("U2", "C1", "my cat"), channel).await;
    assert_eq!(recording.sent_texts(), vec!["meow".to_string()]);
}

#[tokio::test]
async fn test_emoji_rule_reacts_in_order() {
    let (state, _temp) = create_test_state().await;
    let id = state.create_rule("party").await.unwrap();
    state.edit_rule(&id, RuleField::Type, "emoji").await.unwrap();
    state.edit_rule(&id, RuleField::Reaction, "🎉 🥳 🎈").await.unwrap();
    let single = state.create_rule("wave").await.unwrap();
    state.edit_rule(&single, RuleField::Type, "emoji").await.unwrap();
    state.edit_rule(&single, RuleField::Reaction, "👋").await.unwrap();
    let bot = create_test_bot(state, StaticFetcher::default(), None);

    let (recording, channel) = recorder();
    bot.handle(&IncomingMessage::text("U1", "C1", "party time"), channel).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(recording.glyphs(), vec!["🎉", "🥳", "🎈"]);

    let (recording, channel) = recorder();
    bot.handle(&IncomingMessage::text("U1", "C1", "wave hello"), channel).await;
    assert_eq!(recording.glyphs(), vec!["👋"]);
}

#[tokio::test]
async fn test_reactions_setting_disables_rules() {
    let (state, _temp) = create_test_state().await;
    let id = state.create_rule("cat").await.unwrap();
    state.edit_rule(&id, RuleField::Type, "text").await.unwrap();
    state.edit_rule(&id, RuleField::Reaction, "meow").await.unwrap();
    state.update_setting("reactions", "false").await.unwrap();
    let bot = create_test_bot(state, StaticFetcher::default(), None);

    let (recording, channel) = recorder();
    bot.handle(&IncomingMessage::text("U1", "C1", "cat"), channel).await;
    assert!(recording.sent_texts().is_empty());
}

#[tokio::test]
async fn test_sarcasm() {
    let (state, _temp) = create_test_state().await;
    let bot = create_test_bot(state.clone(), StaticFetcher::default(), None);

    let (recording, channel) = recorder();
    bot.handle(&IncomingMessage::text("U1", "C1", "this is great/s"), channel)
        .await;
    assert_eq!(recording.sent_texts(), vec!["ThIs Is GrEaT".to_string()]);

    state.update_setting("sarcasm", "false").await.unwrap();
    let (recording, channel) = recorder();
    bot.handle(&IncomingMessage::text("U1", "C1", "this is great/s"), channel)
        .await;
    assert!(recording.sent_texts().is_empty());
}

#[tokio::test]
async fn test_canned_replies_need_spam() {
    let (state, _temp) = create_test_state().await;
    let bot = create_test_bot(state.clone(), StaticFetcher::default(), None);

    let (recording, channel) = recorder();
    bot.handle(&IncomingMessage::text("U1", "C1", "69"), channel).await;
    assert!(recording.sent_texts().is_empty());

    state.update_setting("spam", "true").await.unwrap();
    let (recording, channel) = recorder();
    bot.handle(&IncomingMessage::text("U1", "C1", "69"), channel).await;
    assert_eq!(recording.sent_texts(), vec!["Nice".to_string()]);
}

#[tokio::test]
async fn test_commands_and_chatter_count_differently() {
    let temp = TempDir::new().unwrap();
    let store = JsonStore::new(temp.path());
    let mut ledger = Ledger::default();
    ledger.counts.insert("U1".into(), 0);
    store.write_json(Document::Counters, &ledger).await.unwrap();
    let state = Arc::new(BotState::load(store).await.unwrap());
    let bot = create_test_bot(state.clone(), StaticFetcher::default(), None);

    let (_, channel) = recorder();
    bot.handle(&IncomingMessage::text("U1", "C1", "hello"), channel.clone())
        .await;
    bot.handle(&IncomingMessage::text("U1", "C1", "!roll"), channel.clone())
        .await;
    bot.handle(&IncomingMessage::text("U2", "C1", "hello"), channel).await;
    assert_eq!(state.ledger().await.counts["U1"], 1);

    let (recording, channel) = recorder();
    bot.handle(&IncomingMessage::text("U1", "C1", "!count"), channel).await;
    assert!(recording.sent_texts()[0].contains("Total: 2"));
    assert!(!state.ledger().await.is_tracked("U2"));
}

#[tokio::test]
async fn test_bot_authors_ignored() {
    let (state, _temp) = create_test_state().await;
    let bot = create_test_bot(state, StaticFetcher::default(), None);

    let mut msg = IncomingMessage::text("B1", "C1", "!version");
    msg.author_is_bot = true;
    let (recording, channel) = recorder();
    bot.handle(&msg, channel).await;
    assert!(recording.sent_texts().is_empty());
}

#[tokio::test]
async fn test_mention_link_search() {
    let (state, _temp) = create_test_state().await;
    let page = concat!(
        "<div class=\"kCrYT\"><a href=\"/url?q=https://www.rust-lang.org/&amp;sa=U&amp;ved=1\">",
        "<div class=\"kCrYT\"><a href=\"/url?q=https://doc.rust-lang.org/book/&amp;sa=U&amp;ved=2\">",
    );
    let fetcher = StaticFetcher::default().with_page(&search_url("rust lang", false), page);
    let bot = create_test_bot(state, fetcher, None);

    let (recording, channel) = recorder();
    let msg = IncomingMessage::text("U1", "C1", "<@999> rust lang").mentioning_bot("999");
    bot.handle(&msg, channel).await;
    assert_eq!(
        recording.sent_texts(),
        vec!["https://www.rust-lang.org/\nhttps://doc.rust-lang.org/book/".to_string()]
    );

    let (recording, channel) = recorder();
    let msg = IncomingMessage::text("U1", "C1", "<@999> something else").mentioning_bot("999");
    bot.handle(&msg, channel).await;
    assert_eq!(recording.sent_texts(), vec![SEARCH_FAILED.to_string()]);
}

#[tokio::test]
async fn test_mention_image_search() {
    let (state, _temp) = create_test_state().await;
    let page = concat!(
        "<img class=\"t0fcAb\" src=\"https://img.example/1&amp;s\"/>",
        "<img class=\"t0fcAb\" src=\"https://img.example/2&amp;s\"/>",
    );
    let fetcher = StaticFetcher::default()
        .with_page(&search_url("cats", true), page)
        .with_page(&search_url("dogs", true), "<html></html>");
    let bot = create_test_bot(state, fetcher, None);

    let (recording, channel) = recorder();
    let msg = IncomingMessage::text("U1", "C1", "<@999> image of cats").mentioning_bot("999");
    bot.handle(&msg, channel).await;
    assert_eq!(recording.sent_texts(), vec!["https://img.example/1".to_string()]);

    let (recording, channel) = recorder();
    let msg = IncomingMessage::text("U1", "C1", "<@999> pictures of cats").mentioning_bot("999");
    bot.handle(&msg, channel).await;
    assert_eq!(
        recording.sent_texts(),
        vec!["https://img.example/1\nhttps://img.example/2".to_string()]
    );

    let (recording, channel) = recorder();
    let msg = IncomingMessage::text("U1", "C1", "<@999> images dogs").mentioning_bot("999");
    bot.handle(&msg, channel).await;
    assert_eq!(recording.sent_texts(), vec![NO_RESULTS.to_string()]);
}

#[tokio::test]
async fn test_mention_command() {
    let (state, _temp) = create_test_state().await;
    let bot = create_test_bot(state, StaticFetcher::default(), Some("4"));

    let (recording, channel) = recorder();
    let msg = IncomingMessage::text("U1", "C1", "<@999> !w 2+2").mentioning_bot("999");
    bot.handle(&msg, channel).await;
    assert_eq!(recording.sent_texts(), vec!["4".to_string()]);
}

#[tokio::test]
async fn test_bare_mention_gets_usage() {
    let (state, _temp) = create_test_state().await;
    let bot = create_test_bot(state, StaticFetcher::default(), None);

    let (recording, channel) = recorder();
    let msg = IncomingMessage::text("U1", "C1", "<@999>").mentioning_bot("999");
    bot.handle(&msg, channel).await;
    assert_eq!(recording.sent_texts(), vec![MENTION_USAGE.to_string()]);
}

#[tokio::test]
async fn test_mention_keeps_other_users_in_query() {
    let (state, _temp) = create_test_state().await;
    let page = "<div class=\"kCrYT\"><a href=\"/url?q=https://example.org/&amp;sa=U&amp;\">";
    let fetcher = StaticFetcher::default().with_page(&search_url("who is <@456>", false), page);
    let bot = create_test_bot(state, fetcher, None);

    let (recording, channel) = recorder();
    let msg = IncomingMessage::text("U1", "C1", "<@999> who is <@456>").mentioning_bot("999");
    bot.handle(&msg, channel).await;
    assert_eq!(recording.sent_texts(), vec!["https://example.org/".to_string()]);
}
