//! Source classification shared by the extractor and change enrichment.
use crate::types::{Platform, SourceType};
use url::Url;

const PLATFORM_HOSTS: &[(&str, Platform)] = &[
    ("reddit.com", Platform::Reddit),
    ("redd.it", Platform::Reddit),
    ("stackoverflow.com", Platform::StackOverflow),
    ("stackexchange.com", Platform::StackOverflow),
    ("linkedin.com", Platform::LinkedIn),
    ("x.com", Platform::X),
    ("twitter.com", Platform::X),
    ("news.ycombinator.com", Platform::HackerNews),
    ("hnrss.org", Platform::HackerNews),
    ("discord.com", Platform::Discord),
    ("discord.gg", Platform::Discord),
];

const OTHER_SOCIAL_HOSTS: &[&str] = &["bsky.app", "mastodon.social", "lobste.rs"];

const ANALYST_HOSTS: &[&str] = &[
    "gartner.com",
    "forrester.com",
    "idc.com",
    "redmonk.com",
    "thenewstack.io",
    "infoq.com",
];

const JOBS_HOSTS: &[&str] = &["greenhouse.io", "lever.co", "workable.com", "ashbyhq.com"];

/// Lowercased host of a URL without a leading `www.`.
pub fn extract_host(url_str: &str) -> Option<String> {
    let parsed = Url::parse(url_str).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    if host.is_empty() {
        return None;
    }
    Some(host.trim_start_matches("www.").to_string())
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Platform for a URL, or `None` when the URL has no usable host.
pub fn platform_for_host(url_str: &str) -> Option<Platform> {
    let host = extract_host(url_str)?;
    let platform = PLATFORM_HOSTS
        .iter()
        .find(|(domain, _)| host_matches(&host, domain))
        .map(|(_, platform)| *platform)
        .unwrap_or(Platform::Other);
    Some(platform)
}

pub fn platform_for_url(url_str: &str) -> Platform {
    platform_for_host(url_str).unwrap_or_default()
}

pub fn source_type_for_url(url_str: &str) -> SourceType {
    let Ok(parsed) = Url::parse(url_str) else {
        return SourceType::Other;
    };
    let Some(host) = extract_host(url_str) else {
        return SourceType::Other;
    };

    if platform_for_url(url_str) != Platform::Other
        || host.contains("mastodon")
        || OTHER_SOCIAL_HOSTS.iter().any(|d| host_matches(&host, d))
    {
        return SourceType::Social;
    }

    if ANALYST_HOSTS.iter().any(|d| host_matches(&host, d)) {
        return SourceType::Analyst;
    }

    let first_segment = parsed
        .path_segments()
        .and_then(|mut segments| segments.next())
        .unwrap_or("")
        .to_ascii_lowercase();
    if JOBS_HOSTS.iter().any(|d| host_matches(&host, d))
        || host.starts_with("careers.")
        || host.starts_with("jobs.")
        || matches!(first_segment.as_str(), "careers" | "jobs")
    {
        return SourceType::Jobs;
    }

    SourceType::Official
}

/// Explicit configuration wins over inference.
pub fn resolve_source_type(explicit: Option<SourceType>, url_str: &str) -> SourceType {
    explicit.unwrap_or_else(|| source_type_for_url(url_str))
}
