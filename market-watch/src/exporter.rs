use crate::types::{EnrichedChange, Result};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::info;

/// Markdown body of the weekly report: change overview table followed by the
/// summary text.
pub fn render_markdown(report_text: &str, changes: &[EnrichedChange], slug: &str) -> String {
    let mut lines = vec![
        format!("# Weekly Market Watch Report ({})", slug),
        String::new(),
        "## Change Overview".to_string(),
        String::new(),
        "| Site | Type | +Added | -Removed |".to_string(),
        "|------|------|:-----:|:--------:|".to_string(),
    ];

    if changes.is_empty() {
        lines.push("| (no sites) | - | 0 | 0 |".to_string());
    } else {
        for c in changes {
            lines.push(format!(
                "| {} | {} | {} | {} |",
                c.url(),
                c.source_type,
                c.change.added_count,
                c.change.removed_count
            ));
        }
    }

    let summary = report_text.trim();
    lines.push(String::new());
    lines.push("## Summary & Recommendations".to_string());
    lines.push(String::new());
    lines.push(if summary.is_empty() {
        "_(empty)_".to_string()
    } else {
        summary.to_string()
    });
    lines.push(String::new());

    lines.join("\n")
}

/// Write `<out_dir>/<YYYY-MM-DD>.md` (local date of `now`), replacing any
/// report already written that day.
pub fn write_markdown(
    report_text: &str,
    changes: &[EnrichedChange],
    out_dir: &Path,
    now: DateTime<Local>,
) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)?;

    let slug = now.format("%Y-%m-%d").to_string();
    let path = out_dir.join(format!("{}.md", slug));

    std::fs::write(&path, render_markdown(report_text, changes, &slug))?;
    info!("Wrote Markdown report to {}", path.display());

    Ok(path)
}
