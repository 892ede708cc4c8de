use crate::classify::source_type_for_url;
use crate::diff::baseline;
use crate::types::{Change, EnrichedChange, Page, SourceType};
use std::collections::HashMap;
use tracing::info;

/// Shape the run's diffs into the payload handed to the summarizer.
///
/// When `force_baseline` is set, or no source changed at all, every page is
/// re-diffed through the baseline policy so a quiet run still has content.
/// Otherwise only sources with additions or removals are kept. Quotes survive
/// only on social sources.
pub fn enrich(changes: &[Change], pages: &[Page], force_baseline: bool) -> Vec<EnrichedChange> {
    let by_url: HashMap<&str, &Page> = pages.iter().map(|p| (p.url.as_str(), p)).collect();

    let no_real_diffs = changes.iter().all(Change::is_empty);

    if force_baseline || no_real_diffs {
        info!(
            "Using baseline changes for {} pages (forced: {})",
            pages.len(),
            force_baseline
        );
        return pages
            .iter()
            .map(|page| attach(baseline(page), Some(page)))
            .collect();
    }

    let enriched: Vec<EnrichedChange> = changes
        .iter()
        .filter(|change| !change.is_empty())
        .map(|change| attach(change.clone(), by_url.get(change.url.as_str()).copied()))
        .collect();

    info!(
        "Real diffs detected in {}/{} sources",
        enriched.len(),
        changes.len()
    );
    enriched
}

fn attach(change: Change, page: Option<&Page>) -> EnrichedChange {
    let source_type = page
        .map(|p| p.source_type)
        .unwrap_or_else(|| source_type_for_url(&change.url));

    let quotes = match (source_type, page) {
        (SourceType::Social, Some(p)) => p.quotes.clone(),
        _ => Vec::new(),
    };

    EnrichedChange {
        change,
        source_type,
        quotes,
    }
}
