use market_watch::types::SourceType;
use market_watch::SnapshotStore;
use pretty_assertions::assert_eq;

mod common;

#[tokio::test]
async fn latest_text_round_trips() {
    common::init_tracing();
    let store = common::memory_store().await;

    let page = common::page("https://example.com", "hello\nworld", SourceType::Official);
    store.append(&page).await.unwrap();

    let latest = store
        .latest_text_for(["https://example.com", "https://unknown.example.com"])
        .await
        .unwrap();

    assert_eq!(latest["https://example.com"], "hello\nworld");
    assert_eq!(latest["https://unknown.example.com"], "");
}

#[tokio::test]
async fn newest_snapshot_wins() {
    let store = common::memory_store().await;

    let mut old = common::page("https://example.com", "old", SourceType::Official);
    old.fetched_at = 100;
    let mut new = common::page("https://example.com", "new", SourceType::Official);
    new.fetched_at = 200;

    // inserted out of order on purpose
    store.append(&new).await.unwrap();
    store.append(&old).await.unwrap();

    let latest = store.latest_text_for(["https://example.com"]).await.unwrap();
    assert_eq!(latest["https://example.com"], "new");
}

#[tokio::test]
async fn same_timestamp_prefers_later_insert() {
    let store = common::memory_store().await;

    let first = common::page("https://example.com", "first", SourceType::Official);
    let second = common::page("https://example.com", "second", SourceType::Official);
    assert_eq!(first.fetched_at, second.fetched_at);

    store.append_all(&[first, second]).await.unwrap();

    let latest = store.latest_text_for(["https://example.com"]).await.unwrap();
    assert_eq!(latest["https://example.com"], "second");
}

#[tokio::test]
async fn history_is_newest_first_and_limited() {
    let store = common::memory_store().await;

    let pages: Vec<_> = (0..5)
        .map(|i| {
            let mut p = common::page("https://example.com", &format!("rev {}", i), SourceType::Official);
            p.fetched_at = 1_000 + i;
            p
        })
        .collect();
    let stored = store.append_all(&pages).await.unwrap();
    assert_eq!(stored, 5);

    let history = store.history_for("https://example.com", 3).await.unwrap();

    let texts: Vec<_> = history.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["rev 4", "rev 3", "rev 2"]);
    assert_eq!(history[0].content_hash, pages[4].content_hash);
    assert!(store.history_for("https://other.example.com", 3).await.unwrap().is_empty());
}

#[tokio::test]
async fn reports_are_listed_newest_first() {
    let store = common::memory_store().await;

    let first = store.save_report(10, "first report").await.unwrap();
    let second = store.save_report(20, "second report").await.unwrap();
    assert!(second.id > first.id);

    let reports = store.recent_reports(5).await.unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0], second);
    assert_eq!(reports[1].content, "first report");
}

#[tokio::test]
async fn file_database_survives_reconnect() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("watch.db").display());

    {
        let store = SnapshotStore::connect(&url).await.unwrap();
        store.init().await.unwrap();
        store
            .append(&common::page("https://example.com", "persisted", SourceType::Official))
            .await
            .unwrap();
        store.close().await;
    }

    let store = SnapshotStore::connect(&url).await.unwrap();
    store.init().await.unwrap();
    let latest = store.latest_text_for(["https://example.com"]).await.unwrap();
    assert_eq!(latest["https://example.com"], "persisted");
    store.close().await;
}
