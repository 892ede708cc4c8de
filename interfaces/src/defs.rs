use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse classification of a watched source. Drives how its changes are
/// presented to the summarizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Official,
    Social,
    Analyst,
    Jobs,
    Other,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Official => "official",
            SourceType::Social => "social",
            SourceType::Analyst => "analyst",
            SourceType::Jobs => "jobs",
            SourceType::Other => "other",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Platform {
    Reddit,
    StackOverflow,
    LinkedIn,
    X,
    HackerNews,
    Discord,
    #[default]
    Other,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Reddit => "Reddit",
            Platform::StackOverflow => "StackOverflow",
            Platform::LinkedIn => "LinkedIn",
            Platform::X => "X",
            Platform::HackerNews => "HackerNews",
            Platform::Discord => "Discord",
            Platform::Other => "Other",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the sites file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSpec {
    pub url: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub explicit_type: Option<SourceType>,
}

/// A single feed item kept as sentiment evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub summary: String,
    pub link: String,
    pub platform: Platform,
    // RFC 3339, as reported by the feed
    pub publication_date: Option<String>,
}

/// The result of fetching and extracting one source during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub url: String,
    pub raw_text: String,
    pub quotes: Vec<Quote>,
    pub source_type: SourceType,
    pub fetched_at: i64,
    pub content_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: i64,
    pub url: String,
    pub fetched_at: i64,
    pub content_hash: String,
    pub text: String,
}

/// Line-level delta for one source. Build it with [`Change::new`] so the
/// counts always match the line lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub url: String,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub added_count: usize,
    pub removed_count: usize,
}

impl Change {
    pub fn new(url: impl Into<String>, added: Vec<String>, removed: Vec<String>) -> Self {
        Self {
            url: url.into(),
            added_count: added.len(),
            removed_count: removed.len(),
            added,
            removed,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedChange {
    #[serde(flatten)]
    pub change: Change,
    pub source_type: SourceType,
    pub quotes: Vec<Quote>,
}

impl EnrichedChange {
    pub fn url(&self) -> &str {
        &self.change.url
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub created_at: i64,
    pub content: String,
}
