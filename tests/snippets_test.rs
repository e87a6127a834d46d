//! Snippets module integration tests, driven through the full lifecycle
//! Run with: cargo test --test snippets_test

mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use common::{ensure_init, memory_host};
use snippets_bot::application::errors::CommandError;
use snippets_bot::application::messaging::FAILURE_PREFIX;
use snippets_bot::application::services::Host;
use snippets_bot::domain::entities::{InboundEvent, OutgoingMessage, Segment, Sender, Snippet};
use snippets_bot::infrastructure::adapters::MemoryAdapter;
use snippets_bot::infrastructure::config::Config;
use snippets_bot::modules::{builtin_registry, LifecycleCoordinator, ModuleState};

const GROUP: i64 = 1001;
const OTHER_GROUP: i64 = 2002;

struct Bot {
    adapter: Arc<MemoryAdapter>,
    host: Arc<Host>,
    lifecycle: LifecycleCoordinator,
    images: tempfile::TempDir,
}

async fn start_bot() -> Bot {
    ensure_init();
    let images = tempfile::tempdir().unwrap();

    let mut config = Config::default();
    config.database.dsn = ":memory:".to_string();
    config.snippets.groups = vec![GROUP];
    config.snippets.image_dir = images.path().join("images");

    let (adapter, host) = memory_host(config);
    let lifecycle = LifecycleCoordinator::new(builtin_registry().unwrap())
        .with_stop_timeout(Some(Duration::from_secs(5)));
    lifecycle.startup(&host).await.unwrap();

    Bot {
        adapter,
        host,
        lifecycle,
        images,
    }
}

fn alice() -> Sender {
    Sender::new(42, "alice").with_card_name("Alice")
}

fn add_command(image: &[u8]) -> InboundEvent {
    InboundEvent::new(GROUP, alice())
        .with_text("!添加语录")
        .with_image(image.to_vec())
}

fn random_command() -> InboundEvent {
    InboundEvent::new(GROUP, Sender::new(7, "bob")).with_text("!随机语录")
}

fn image_of(message: &OutgoingMessage) -> Option<Vec<u8>> {
    message.segments.iter().find_map(|s| match s {
        Segment::Image(data) => Some(data.clone()),
        Segment::Text(_) => None,
    })
}

fn stored_files(bot: &Bot) -> usize {
    std::fs::read_dir(bot.images.path().join("images"))
        .unwrap()
        .count()
}

fn last_reply(bot: &Bot) -> OutgoingMessage {
    bot.adapter.sent_to(GROUP).pop().expect("bot should have replied")
}

#[tokio::test]
async fn test_add_snippet_replies_with_record() {
    let bot = start_bot().await;

    let report = bot.host.dispatch(add_command(b"fake png bytes")).await;
    assert_eq!(report.delivered, 2);
    assert_eq!(report.failed, 0);

    let reply = last_reply(&bot);
    assert!(!reply.has_image());
    let text = reply.plain_text();
    let json = text
        .strip_prefix("[✓] 语录已添加为如下记录\n")
        .expect("success header");

    let snippet: Snippet = serde_json::from_str(json).unwrap();
    assert!(snippet.id > 0);
    assert_eq!(snippet.from_user_uin, 42);
    assert_eq!(snippet.from_user_display, "Alice");
    assert_eq!(snippet.from_group, GROUP);
    assert!(snippet.deleted_at.is_none());
    assert_eq!(std::fs::read(&snippet.image_path).unwrap(), b"fake png bytes");
}

#[tokio::test]
async fn test_image_before_command_text_is_accepted() {
    let bot = start_bot().await;

    let event = InboundEvent::new(GROUP, alice())
        .with_image(b"leading image".to_vec())
        .with_text("  ！添加语录  ");
    bot.host.dispatch(event).await;

    assert!(last_reply(&bot).plain_text().starts_with("[✓] "));
    assert_eq!(stored_files(&bot), 1);
}

#[tokio::test]
async fn test_random_snippet_returns_stored_image() {
    let bot = start_bot().await;
    bot.host.dispatch(add_command(b"the only image")).await;

    bot.host.dispatch(random_command()).await;

    let reply = last_reply(&bot);
    assert_eq!(
        reply.plain_text(),
        format!("由 Alice (42) 录入于群 {} 的随机语录 #1：", GROUP)
    );
    assert_eq!(image_of(&reply).as_deref(), Some(&b"the only image"[..]));
}

#[tokio::test]
async fn test_random_snippet_reaches_every_record() {
    let bot = start_bot().await;
    let images: Vec<&[u8]> = vec![&b"one"[..], &b"two"[..], &b"three"[..]];
    for image in &images {
        bot.host.dispatch(add_command(image)).await;
    }

    let mut seen = HashSet::new();
    for _ in 0..80 {
        bot.host.dispatch(random_command()).await;
        let image = image_of(&last_reply(&bot)).expect("random reply carries an image");
        seen.insert(image);
    }

    let expected: HashSet<Vec<u8>> = images.iter().map(|i| i.to_vec()).collect();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn test_random_on_empty_store_reports_failure() {
    let bot = start_bot().await;

    let report = bot.host.dispatch(random_command()).await;
    assert_eq!(report.failed, 0);

    let reply = last_reply(&bot);
    assert!(!reply.has_image());
    assert_eq!(
        reply.plain_text(),
        format!("{}{}", FAILURE_PREFIX, CommandError::EmptyStore)
    );
}

#[tokio::test]
async fn test_add_without_image_reports_missing_payload() {
    let bot = start_bot().await;

    bot.host
        .dispatch(InboundEvent::new(GROUP, alice()).with_text("!添加语录"))
        .await;

    let reply = last_reply(&bot).plain_text();
    assert!(reply.starts_with("[!] 语录添加失败"));
    assert!(reply.contains("no image found"));
    assert_eq!(stored_files(&bot), 0);
}

#[tokio::test]
async fn test_same_image_twice_shares_one_file() {
    let bot = start_bot().await;

    bot.host.dispatch(add_command(b"duplicate")).await;
    bot.host.dispatch(add_command(b"duplicate")).await;

    let records: Vec<Snippet> = bot
        .adapter
        .sent_to(GROUP)
        .iter()
        .map(|m| {
            let text = m.plain_text();
            let json = text.split_once('\n').map(|(_, j)| j.to_string()).unwrap();
            serde_json::from_str(&json).unwrap()
        })
        .collect();

    assert_eq!(records.len(), 2);
    assert_ne!(records[0].id, records[1].id);
    assert_eq!(records[0].image_path, records[1].image_path);
    assert_eq!(stored_files(&bot), 1);
}

#[tokio::test]
async fn test_plain_chatter_is_ignored() {
    let bot = start_bot().await;

    bot.host
        .dispatch(InboundEvent::new(GROUP, alice()).with_text("just talking"))
        .await;
    // Trailing chatter after the command cancels it
    bot.host
        .dispatch(add_command(b"cancelled").with_text("never mind"))
        .await;

    assert!(bot.adapter.sent().is_empty());
    assert_eq!(stored_files(&bot), 0);
}

#[tokio::test]
async fn test_other_groups_are_only_logged() {
    let bot = start_bot().await;

    let event = InboundEvent::new(OTHER_GROUP, alice())
        .with_text("!添加语录")
        .with_image(b"elsewhere".to_vec());
    let report = bot.host.dispatch(event).await;

    assert_eq!(report.delivered, 1);
    assert_eq!(bot.host.router().interested(OTHER_GROUP), vec!["internal.logging"]);
    assert!(bot.adapter.sent().is_empty());
    assert_eq!(stored_files(&bot), 0);
}

#[tokio::test]
async fn test_send_failure_is_isolated() {
    let bot = start_bot().await;

    bot.adapter.set_fail_sends(true);
    let report = bot.host.dispatch(add_command(b"unsent")).await;
    assert_eq!(report.delivered, 1);
    assert_eq!(report.failed, 1);

    // The record was stored even though the reply was lost
    bot.adapter.set_fail_sends(false);
    bot.host.dispatch(random_command()).await;
    assert_eq!(image_of(&last_reply(&bot)).as_deref(), Some(&b"unsent"[..]));
}

#[tokio::test]
async fn test_end_to_end_through_listener() {
    let bot = start_bot().await;
    let mut listener = bot.host.listen();

    bot.adapter.inject(add_command(b"via listener")).await.unwrap();
    assert!(common::wait_for(Duration::from_secs(2), || bot.adapter.sent().len() == 1).await);

    bot.adapter.close();
    tokio::time::timeout(Duration::from_secs(2), listener.closed())
        .await
        .unwrap();
    listener.abort();
}

#[tokio::test]
async fn test_shutdown_stops_every_module() {
    let bot = start_bot().await;
    bot.host.dispatch(add_command(b"before shutdown")).await;

    bot.lifecycle.shutdown(&bot.host).await.unwrap();

    for (id, state) in bot.lifecycle.states() {
        assert_eq!(state, ModuleState::Stopped, "module {}", id);
    }

    // The store is closed: a read failure, not an empty store
    bot.host.dispatch(random_command()).await;
    let reply = last_reply(&bot).plain_text();
    let closed = CommandError::StorageRead("Store is closed".to_string());
    assert_eq!(reply, format!("{}{}", FAILURE_PREFIX, closed));
    assert_ne!(reply, format!("{}{}", FAILURE_PREFIX, CommandError::EmptyStore));
}
