use crate::traits::Fetch;
use crate::types::{FetchConfig, Result, WatchError};
use async_trait::async_trait;
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn retry_backoff(&self) -> ExponentialBackoff<backoff::SystemClock> {
        let initial = Duration::from_millis(self.config.retry_delay_millis);
        ExponentialBackoff {
            current_interval: initial,
            initial_interval: initial,
            max_interval: initial * 16,
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        }
    }

    async fn fetch_once(&self, url: &str) -> std::result::Result<String, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            ));
        }

        response.text().await.map_err(|e| e.to_string())
    }
}

#[async_trait]
impl Fetch for Fetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let start_time = Instant::now();
        let mut backoff = self.retry_backoff();
        let mut last_error = String::from("Unknown error");

        debug!("Fetching {}", url);

        for attempt in 0..=self.config.max_retries {
            match self.fetch_once(url).await {
                Ok(body) => {
                    info!(
                        "Fetched {} ({} bytes in {}ms)",
                        url,
                        body.len(),
                        start_time.elapsed().as_millis()
                    );
                    return Ok(body);
                }
                Err(e) => {
                    last_error = e;
                    if attempt < self.config.max_retries {
                        if let Some(delay) = backoff.next_backoff() {
                            warn!(
                                "Attempt {} failed for {}: {}, retrying in {:?}",
                                attempt + 1,
                                url,
                                last_error,
                                delay
                            );
                            tokio::time::sleep(delay).await;
                        }
                    }
                }
            }
        }

        Err(WatchError::Fetch {
            url: url.to_string(),
            reason: last_error,
        })
    }
}
