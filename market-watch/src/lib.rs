pub mod types;
pub mod traits;
pub mod classify;
pub mod extractor;
pub mod store;
pub mod diff;
pub mod enrich;
pub mod fetcher;
pub mod summarizer;
pub mod exporter;
pub mod config;
pub mod pipeline;

pub use types::*;
pub use traits::{Fetch, Summarize};
pub use store::SnapshotStore;
pub use fetcher::Fetcher;
pub use summarizer::{MockSummarizer, OpenAiSummarizer, RetryingSummarizer};
pub use pipeline::{MarketWatch, RunOptions, RunOutcome, RunStatus};
