use crate::types::{FetchConfig, Result, SiteSpec, SummarizerConfig, WatchError};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::warn;
use url::Url;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://market_watch.db";
pub const DEFAULT_SITES_PATH: &str = "sites.yaml";
pub const DEFAULT_REPORTS_DIR: &str = "reports";

#[derive(Debug, Deserialize)]
struct SitesFile {
    sites: Vec<SiteSpec>,
}

/// Parse a sites document. Order is kept; a url listed twice is only
/// watched once.
pub fn parse_sites(yaml: &str) -> Result<Vec<SiteSpec>> {
    let file: SitesFile = serde_yaml::from_str(yaml)?;
    let mut seen = HashSet::new();
    let mut sites = Vec::with_capacity(file.sites.len());

    for site in file.sites {
        let parsed = Url::parse(&site.url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(WatchError::Config(format!(
                "unsupported scheme for site {}",
                site.url
            )));
        }
        if !seen.insert(site.url.clone()) {
            warn!("Duplicate site {} ignored", site.url);
            continue;
        }
        sites.push(site);
    }

    Ok(sites)
}

pub fn load_sites(path: &Path) -> Result<Vec<SiteSpec>> {
    let yaml = std::fs::read_to_string(path).map_err(|e| {
        WatchError::Config(format!("cannot read sites file {}: {}", path.display(), e))
    })?;
    parse_sites(&yaml)
}

/// Runtime settings, resolved from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub sites_path: PathBuf,
    pub reports_dir: PathBuf,
    pub force_baseline: bool,
    pub fetch: FetchConfig,
    pub summarizer: SummarizerConfig,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut fetch = FetchConfig::default();
        if let Some(n) = non_empty("FETCH_CONCURRENCY").and_then(|v| v.parse().ok()) {
            fetch.concurrency = n;
        }
        if let Some(n) = non_empty("FETCH_MAX_RETRIES").and_then(|v| v.parse().ok()) {
            fetch.max_retries = n;
        }

        let mut summarizer = SummarizerConfig {
            api_key: non_empty("OPENAI_API_KEY"),
            ..SummarizerConfig::default()
        };
        if let Some(model) = non_empty("OPENAI_MODEL") {
            summarizer.model = model;
        }
        if let Some(base_url) = non_empty("OPENAI_BASE_URL") {
            summarizer.base_url = base_url;
        }

        Self {
            database_url: non_empty("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            sites_path: non_empty("SITES_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SITES_PATH)),
            reports_dir: non_empty("REPORTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORTS_DIR)),
            force_baseline: lookup("FORCE_SUMMARY").is_some_and(|v| v.trim() == "1"),
            fetch,
            summarizer,
        }
    }
}
