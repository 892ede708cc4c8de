use crate::diff::diff;
use crate::enrich::enrich;
use crate::exporter::write_markdown;
use crate::extractor::build_page;
use crate::store::SnapshotStore;
use crate::summarizer::summarize_or_skip;
use crate::traits::{Fetch, Summarize};
use crate::types::{Change, EnrichedChange, Page, Report, Result, SiteSpec};
use chrono::{Local, Utc};
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub const EMPTY_BATCH_TEXT: &str = "No pages fetched this run (all sites skipped or failed).";

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub reports_dir: PathBuf,
    pub force_baseline: bool,
    pub concurrency: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            reports_dir: PathBuf::from("reports"),
            force_baseline: false,
            concurrency: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    /// Every source failed to fetch; a placeholder report was written.
    EmptyBatch,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub report: Report,
    pub markdown_path: PathBuf,
    pub pages_fetched: usize,
    pub sources_skipped: Vec<String>,
    pub changes: Vec<EnrichedChange>,
}

/// The weekly batch: fetch, extract, diff against history, summarize, persist.
pub struct MarketWatch {
    store: Arc<SnapshotStore>,
    fetcher: Arc<dyn Fetch>,
    summarizer: Arc<dyn Summarize>,
    options: RunOptions,
}

impl MarketWatch {
    pub fn new(
        store: Arc<SnapshotStore>,
        fetcher: Arc<dyn Fetch>,
        summarizer: Arc<dyn Summarize>,
        options: RunOptions,
    ) -> Self {
        Self {
            store,
            fetcher,
            summarizer,
            options,
        }
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Fetch every site, keeping the configured order. Sites that fail are
    /// logged and returned separately; they take no further part in the run.
    pub async fn fetch_pages(&self, sites: &[SiteSpec]) -> (Vec<Page>, Vec<String>) {
        let fetcher = self.fetcher.as_ref();

        let results: Vec<_> = stream::iter(sites)
            .map(|site| async move {
                info!("Fetching: {}", site.url);
                let result = fetcher.fetch(&site.url).await;
                (site, result, Utc::now().timestamp())
            })
            .buffered(self.options.concurrency.max(1))
            .collect()
            .await;

        let mut pages = Vec::with_capacity(results.len());
        let mut skipped = Vec::new();

        for (site, result, fetched_at) in results {
            match result {
                Ok(body) => pages.push(build_page(site, &body, fetched_at)),
                Err(e) => {
                    warn!("Skipping {}: {}", site.url, e);
                    skipped.push(site.url.clone());
                }
            }
        }

        (pages, skipped)
    }

    /// Diff each page against the latest stored snapshot for its url.
    pub async fn compute_changes(&self, pages: &[Page]) -> Result<Vec<Change>> {
        let previous = self
            .store
            .latest_text_for(pages.iter().map(|p| p.url.as_str()))
            .await?;

        Ok(pages
            .iter()
            .map(|page| {
                let previous_text = previous.get(&page.url).map(String::as_str).unwrap_or("");
                diff(page, previous_text)
            })
            .collect())
    }

    pub async fn run_once(&self, sites: &[SiteSpec]) -> Result<RunOutcome> {
        let _run = self.store.lock_run().await;

        info!("Fetching site content for {} sites", sites.len());
        let (pages, skipped) = self.fetch_pages(sites).await;

        if pages.is_empty() {
            warn!("{}", EMPTY_BATCH_TEXT);
            let report = self
                .store
                .save_report(Utc::now().timestamp(), EMPTY_BATCH_TEXT)
                .await?;
            let markdown_path =
                write_markdown(EMPTY_BATCH_TEXT, &[], &self.options.reports_dir, Local::now())?;

            return Ok(RunOutcome {
                status: RunStatus::EmptyBatch,
                report,
                markdown_path,
                pages_fetched: 0,
                sources_skipped: skipped,
                changes: Vec::new(),
            });
        }

        info!("Fetched {} pages, comparing with last snapshots", pages.len());
        let changes = self.compute_changes(&pages).await?;
        let enriched = enrich(&changes, &pages, self.options.force_baseline);

        info!(
            "Sending {} changes to {}",
            enriched.len(),
            self.summarizer.name()
        );
        let report_text = summarize_or_skip(self.summarizer.as_ref(), &enriched).await?;

        // Snapshots are stored regardless of force_baseline.
        self.store.append_all(&pages).await?;

        let markdown_path =
            write_markdown(&report_text, &enriched, &self.options.reports_dir, Local::now())?;
        let report = self
            .store
            .save_report(Utc::now().timestamp(), &report_text)
            .await?;

        info!("Run complete, report {} saved", report.id);

        Ok(RunOutcome {
            status: RunStatus::Completed,
            report,
            markdown_path,
            pages_fetched: pages.len(),
            sources_skipped: skipped,
            changes: enriched,
        })
    }
}
