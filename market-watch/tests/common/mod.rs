#![allow(dead_code)]

use async_trait::async_trait;
use market_watch::extractor::{content_hash, normalize};
use market_watch::types::{EnrichedChange, Page, Quote, Result, SourceType, WatchError};
use market_watch::{Fetch, SnapshotStore, Summarize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Page whose text is normalized the same way the extractor would.
pub fn page(url: &str, text: &str, source_type: SourceType) -> Page {
    let raw_text = normalize(text);
    Page {
        url: url.to_string(),
        content_hash: content_hash(&raw_text),
        raw_text,
        quotes: Vec::new(),
        source_type,
        fetched_at: 1_700_000_000,
    }
}

pub fn quote(summary: &str, link: &str) -> Quote {
    Quote {
        summary: summary.to_string(),
        link: link.to_string(),
        platform: market_watch::classify::platform_for_url(link),
        publication_date: None,
    }
}

pub async fn memory_store() -> SnapshotStore {
    let store = SnapshotStore::connect_in_memory()
        .await
        .expect("in-memory store");
    store.init().await.expect("schema");
    store
}

/// Serves canned bodies; a url mapped to `None` (or not mapped) fails.
/// Bodies can be swapped between runs.
#[derive(Default)]
pub struct StaticFetcher {
    bodies: Mutex<HashMap<String, Option<String>>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: &str, body: &str) {
        self.bodies
            .lock()
            .unwrap()
            .insert(url.to_string(), Some(body.to_string()));
    }

    pub fn fail(&self, url: &str) {
        self.bodies.lock().unwrap().insert(url.to_string(), None);
    }
}

#[async_trait]
impl Fetch for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        match self.bodies.lock().unwrap().get(url) {
            Some(Some(body)) => Ok(body.clone()),
            _ => Err(WatchError::Fetch {
                url: url.to_string(),
                reason: "HTTP 503: Service Unavailable".to_string(),
            }),
        }
    }
}

/// Fails with the given error kind a fixed number of times, then echoes the
/// urls it was given. Records every batch it saw.
pub struct ScriptedSummarizer {
    failures_left: AtomicUsize,
    transient: bool,
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<Vec<EnrichedChange>>>,
}

impl ScriptedSummarizer {
    pub fn succeeding() -> Self {
        Self::failing(0, true)
    }

    pub fn failing(times: usize, transient: bool) -> Self {
        Self {
            failures_left: AtomicUsize::new(times),
            transient,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Summarize for ScriptedSummarizer {
    fn name(&self) -> String {
        "scripted".to_string()
    }

    async fn summarize(&self, changes: &[EnrichedChange]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(changes.to_vec());

        let remaining = self.failures_left.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_left.store(remaining - 1, Ordering::SeqCst);
            return Err(if self.transient {
                WatchError::TransientService("HTTP 503".to_string())
            } else {
                WatchError::Summarizer("HTTP 401: invalid key".to_string())
            });
        }

        Ok(changes
            .iter()
            .map(|c| format!("{} +{} -{}", c.url(), c.change.added_count, c.change.removed_count))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
