// Use the interfaces crate for the shared data model
pub use watch_interfaces::defs::{
    Change, EnrichedChange, Page, Platform, Quote, Report, SiteSpec, Snapshot, SourceType,
};

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_millis: u64,
    pub concurrency: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (compatible; MarketWatch/0.1)".to_string(),
            timeout_seconds: 15,
            max_retries: 2,
            retry_delay_millis: 500,
            concurrency: 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
    pub max_attempts: u32,
    pub initial_backoff_millis: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            timeout_seconds: 120,
            max_attempts: 4,
            initial_backoff_millis: 1_000,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Extraction degraded: {0}")]
    Extraction(String),

    #[error("Summarizer temporarily unavailable: {0}")]
    TransientService(String),

    #[error("Summarizer error: {0}")]
    Summarizer(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WatchError {
    pub fn is_transient(&self) -> bool {
        matches!(self, WatchError::TransientService(_))
    }
}

pub type Result<T> = std::result::Result<T, WatchError>;
