use crate::extractor::normalized_lines;
use crate::types::{Change, Page};
use similar::{Algorithm, ChangeTag, TextDiff};
use tracing::debug;

/// Upper bound on lines reported for a source with no usable history.
pub const BASELINE_LINE_CAP: usize = 200;

/// Compare a freshly extracted page against the text of its latest snapshot.
///
/// An empty previous text (no snapshot, or an empty one) takes the baseline
/// path: the first [`BASELINE_LINE_CAP`] current lines are reported as added.
/// Otherwise a Myers line diff is run over the normalized lines of both
/// sides and insertions/deletions are reported in diff order, uncapped.
pub fn diff(current: &Page, previous_text: &str) -> Change {
    let previous = normalized_lines(previous_text);
    if previous.is_empty() {
        return baseline(current);
    }

    let current_lines = normalized_lines(&current.raw_text);
    let old: Vec<&str> = previous.iter().map(String::as_str).collect();
    let new: Vec<&str> = current_lines.iter().map(String::as_str).collect();

    let text_diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_slices(&old, &new);

    let mut added = Vec::new();
    let mut removed = Vec::new();
    for change in text_diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => added.push(change.value().to_string()),
            ChangeTag::Delete => removed.push(change.value().to_string()),
            ChangeTag::Equal => {}
        }
    }

    debug!(
        "Diff for {}: +{} -{}",
        current.url,
        added.len(),
        removed.len()
    );

    Change::new(current.url.clone(), added, removed)
}

/// Baseline view of a page: its first lines as additions, nothing removed.
pub fn baseline(page: &Page) -> Change {
    let added: Vec<String> = normalized_lines(&page.raw_text)
        .into_iter()
        .take(BASELINE_LINE_CAP)
        .collect();
    Change::new(page.url.clone(), added, Vec::new())
}
