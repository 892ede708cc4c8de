use crate::classify::{platform_for_host, platform_for_url, resolve_source_type};
use crate::types::{Page, Platform, Quote, SiteSpec, WatchError};
use feed_rs::parser;
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use tracing::{debug, warn};
use url::Url;

static RE_COMMENTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static RE_NON_TEXT: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap(),
        Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap(),
        Regex::new(r"(?is)<noscript\b[^>]*>.*?</noscript\s*>").unwrap(),
    ]
});
static RE_MAIN_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<main(?:\s[^>]*)?/?>").unwrap());
static RE_ROLE_MAIN_OPEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)<([a-z][a-z0-9]*)\s(?:[^>]*\s)?role\s*=\s*(?:"main"|'main'|main)(?:[\s/][^>]*)?>"#,
    )
    .unwrap()
});
static RE_BODY_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<body\b[^>]*>").unwrap());
// Tags that break a line of text; everything else is stripped in place.
static RE_BLOCK_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)</?(?:p|div|br|hr|li|dt|dd|h[1-6]|tr|td|th|section|article|aside|nav|header|footer|main|ul|ol|dl|table|blockquote|pre|figure|figcaption)\b[^>]*>",
    )
    .unwrap()
});
static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Normalized text plus the feed items it was built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub text: String,
    pub quotes: Vec<Quote>,
}

/// Heuristic feed sniffing. Misses fall through to the HTML path.
pub fn is_feed_like(payload: &str) -> bool {
    let lower = payload.to_ascii_lowercase();
    lower.contains("<rss") || lower.contains("<feed") || lower.contains("application/rss+xml")
}

/// Turn a raw payload into normalized text and quotes. Never fails: broken
/// markup yields whatever could be recovered, possibly nothing.
pub fn extract(raw_payload: &str, source_url: &str) -> Extraction {
    if is_feed_like(raw_payload) {
        match extract_feed(raw_payload, source_url) {
            Ok(extraction) => return extraction,
            Err(e) => {
                warn!("{} for {}, keeping an empty extraction", e, source_url);
                return Extraction::default();
            }
        }
    }

    Extraction {
        text: normalize(&extract_html_text(raw_payload)),
        quotes: Vec::new(),
    }
}

fn extract_feed(raw_payload: &str, source_url: &str) -> Result<Extraction, WatchError> {
    let feed = parser::parse(raw_payload.as_bytes())
        .map_err(|e| WatchError::Extraction(format!("feed parse failed: {}", e)))?;

    let feed_platform = platform_for_url(source_url);
    let mut quotes = Vec::with_capacity(feed.entries.len());

    for entry in feed.entries {
        let summary = match entry.title {
            Some(title) => collapse_whitespace(&title.content),
            None => String::new(),
        };
        if summary.is_empty() {
            debug!("Dropping untitled feed entry {}", entry.id);
            continue;
        }

        let link = entry
            .links
            .iter()
            .map(|l| l.href.trim())
            .find(|href| !href.is_empty())
            .map(str::to_string)
            .or_else(|| is_web_url(&entry.id).then(|| entry.id.trim().to_string()))
            .unwrap_or_else(|| source_url.to_string());

        let platform = match platform_for_host(&link) {
            Some(Platform::Other) | None => feed_platform,
            Some(platform) => platform,
        };

        let publication_date = entry.published.or(entry.updated).map(|dt| dt.to_rfc3339());

        quotes.push(Quote {
            summary,
            link,
            platform,
            publication_date,
        });
    }

    let combined = quotes
        .iter()
        .map(|q| format!("[{}] {} ({})", q.platform, q.summary, q.link))
        .collect::<Vec<_>>()
        .join("\n");

    debug!("Extracted {} feed items from {}", quotes.len(), source_url);

    Ok(Extraction {
        text: normalize(&combined),
        quotes,
    })
}

fn is_web_url(candidate: &str) -> bool {
    Url::parse(candidate.trim())
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

fn collapse_whitespace(s: &str) -> String {
    RE_WS.replace_all(s, " ").trim().to_string()
}

/// Plain text of an HTML document, one text run per line. Scoped to the main
/// content landmark when the page has one.
pub fn extract_html_text(html: &str) -> String {
    let mut cleaned = RE_COMMENTS.replace_all(html, "").into_owned();
    for re in RE_NON_TEXT.iter() {
        cleaned = re.replace_all(&cleaned, "").into_owned();
    }

    let region = main_region(&cleaned)
        .or_else(|| body_region(&cleaned))
        .unwrap_or(&cleaned);

    let broken = RE_BLOCK_TAG.replace_all(region, "\n");
    let text = RE_TAG.replace_all(&broken, "");
    let decoded = html_escape::decode_html_entities(&text);

    decoded
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn main_region(html: &str) -> Option<&str> {
    if let Some(open) = RE_MAIN_OPEN.find(html) {
        return Some(element_inner(html, open.end(), "main"));
    }
    let caps = RE_ROLE_MAIN_OPEN.captures(html)?;
    let open = caps.get(0)?;
    let tag = caps.get(1)?.as_str().to_ascii_lowercase();
    Some(element_inner(html, open.end(), &tag))
}

fn body_region(html: &str) -> Option<&str> {
    let open = RE_BODY_OPEN.find(html)?;
    Some(element_inner(html, open.end(), "body"))
}

/// Content from `start` up to the close tag balancing an already-opened
/// `tag`, or to the end of the document when it never closes.
fn element_inner<'a>(html: &'a str, start: usize, tag: &str) -> &'a str {
    let rest = &html[start..];
    let lower = rest.to_ascii_lowercase();
    let open_pat = format!("<{}", tag);
    let close_pat = format!("</{}", tag);

    let mut depth = 1usize;
    let mut pos = 0usize;
    while pos < lower.len() {
        let next_open = find_tag(&lower, &open_pat, pos);
        let next_close = find_tag(&lower, &close_pat, pos);
        match (next_open, next_close) {
            (Some(o), Some(c)) if o < c => {
                depth += 1;
                pos = o + open_pat.len();
            }
            (_, Some(c)) => {
                depth -= 1;
                if depth == 0 {
                    return &rest[..c];
                }
                pos = c + close_pat.len();
            }
            (_, None) => break,
        }
    }
    rest
}

// Matches `pat` only when followed by a tag-name boundary, so `<main` does
// not match `<mainframe`.
fn find_tag(haystack: &str, pat: &str, from: usize) -> Option<usize> {
    let mut search = from;
    while let Some(idx) = haystack[search..].find(pat) {
        let at = search + idx;
        let after = haystack[at + pat.len()..].chars().next();
        if matches!(after, None | Some('>') | Some('/')) || after.is_some_and(char::is_whitespace) {
            return Some(at);
        }
        search = at + pat.len();
    }
    None
}

/// Canonical lines: lowercased, trimmed, non-empty, first occurrence only.
pub fn normalized_lines(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.lines()
        .map(|line| line.trim().to_lowercase())
        .filter(|line| !line.is_empty())
        .filter(|line| seen.insert(line.clone()))
        .collect()
}

pub fn normalize(text: &str) -> String {
    normalized_lines(text).join("\n")
}

/// Hex SHA-256 of the normalized text.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Build the run's `Page` for a site from its fetched payload.
pub fn build_page(site: &SiteSpec, raw_payload: &str, fetched_at: i64) -> Page {
    let extraction = extract(raw_payload, &site.url);
    Page {
        url: site.url.clone(),
        content_hash: content_hash(&extraction.text),
        raw_text: extraction.text,
        quotes: extraction.quotes,
        source_type: resolve_source_type(site.explicit_type, &site.url),
        fetched_at,
    }
}
