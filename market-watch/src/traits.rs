use crate::types::{EnrichedChange, Result};
use async_trait::async_trait;

/// Retrieves the raw payload of a source.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Body of `url` as text. Fails with `WatchError::Fetch` once retries are
    /// exhausted.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Turns a run's enriched changes into report text.
#[async_trait]
pub trait Summarize: Send + Sync {
    /// Human-readable name, used in logs
    fn name(&self) -> String;

    /// Transient outages surface as `WatchError::TransientService` so callers
    /// can decide to retry.
    async fn summarize(&self, changes: &[EnrichedChange]) -> Result<String>;
}
