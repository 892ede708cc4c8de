use crate::traits::Summarize;
use crate::types::{EnrichedChange, Result, SummarizerConfig, WatchError};
use async_trait::async_trait;
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const NO_CHANGES_TEXT: &str = "No changes detected this period.";

/// Bullet lines sent per source.
const MAX_LINES_PER_SOURCE: usize = 60;

const SYSTEM_PROMPT: &str = "You are a head of product marketing reviewing competitive and market intelligence. \
Your goal is to brief the executive team and guide the marketing org. \
You write in a clear, concise, executive style.";

const USER_PROMPT: &str = r#"You receive diffs of market and competitor content (blogs, release notes, forums, analyst notes).
Produce a structured weekly report with these sections:

# Executive Summary
- High-level highlights across all competitors and market chatter.
- Major risks or opportunities.

# By Competitor
For each competitor that appears in the diffs:
- Key updates from official sources (blogs, changelogs, docs).
- Implications for us.
- Risks / Opportunities.

# By Site Type
- **Analyst / Media**: summarize analyst and media sources.
- **Community / Forums**: summarize social and forum sources, using the quotes as evidence.
- Highlight sentiment, recurring themes, adoption pain points.

# Recommendations
- 3-5 actionable moves (messaging, enablement, content).
- Note dependencies on other teams.

---
Here are the raw diffs to analyze:

{diffs}
"#;

/// Render enriched changes as the plain-text diff block embedded in the prompt.
pub fn build_diffs_text(changes: &[EnrichedChange]) -> String {
    if changes.is_empty() {
        return "(no diffs)".to_string();
    }

    let sections: Vec<String> = changes
        .iter()
        .map(|c| {
            let bullets = if c.change.added.is_empty() {
                "(no visible changes)".to_string()
            } else {
                c.change
                    .added
                    .iter()
                    .take(MAX_LINES_PER_SOURCE)
                    .map(|line| format!("• {}", line))
                    .collect::<Vec<_>>()
                    .join("\n")
            };

            let quotes = if c.quotes.is_empty() {
                String::new()
            } else {
                let lines = c
                    .quotes
                    .iter()
                    .map(|q| format!("• “{}” — [source]({})", q.summary, q.link))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("\n\n🔗 Quotes:\n{}", lines)
            };

            format!("### {}\n\n{}{}", c.url(), bullets, quotes)
        })
        .collect();

    sections.join("\n\n")
}

pub fn has_visible_changes(changes: &[EnrichedChange]) -> bool {
    changes.iter().any(|c| !c.change.is_empty())
}

/// Summarize, or return [`NO_CHANGES_TEXT`] without calling the service when
/// nothing changed.
pub async fn summarize_or_skip(
    summarizer: &dyn Summarize,
    changes: &[EnrichedChange],
) -> Result<String> {
    if !has_visible_changes(changes) {
        info!("No visible changes, skipping {}", summarizer.name());
        return Ok(NO_CHANGES_TEXT.to_string());
    }
    summarizer.summarize(changes).await
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Chat-completions client for OpenAI-compatible endpoints.
pub struct OpenAiSummarizer {
    client: Client,
    config: SummarizerConfig,
}

impl OpenAiSummarizer {
    pub fn new(config: SummarizerConfig) -> Result<Self> {
        if config.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(WatchError::Config(
                "OPENAI_API_KEY not set. Set it in .env or the environment.".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Summarize for OpenAiSummarizer {
    fn name(&self) -> String {
        format!("OpenAI summarizer ({})", self.config.model)
    }

    async fn summarize(&self, changes: &[EnrichedChange]) -> Result<String> {
        let diffs = build_diffs_text(changes);
        let request = ChatRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: USER_PROMPT.replace("{diffs}", &diffs),
                },
            ],
        };

        debug!("Sending {} bytes of diffs to {}", diffs.len(), self.endpoint());

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.config.api_key.as_deref().unwrap_or_default())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() || e.is_request() {
                    WatchError::TransientService(e.to_string())
                } else {
                    WatchError::Http(e)
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(WatchError::TransientService(format!("HTTP {}", status.as_u16())));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WatchError::Summarizer(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let parsed: ChatResponse = response.json().await?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| WatchError::Summarizer("response contained no choices".to_string()))?;

        Ok(text.trim().to_string())
    }
}

/// Offline summarizer for dry runs and tests. Output depends only on the input.
pub struct MockSummarizer {
    name: String,
}

impl MockSummarizer {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for MockSummarizer {
    fn default() -> Self {
        Self::new("default")
    }
}

#[async_trait]
impl Summarize for MockSummarizer {
    fn name(&self) -> String {
        format!("Mock summarizer ({})", self.name)
    }

    async fn summarize(&self, changes: &[EnrichedChange]) -> Result<String> {
        let mut digest = String::from("# Executive Summary\n\n");
        for c in changes {
            digest.push_str(&format!(
                "- {} ({}): +{} / -{}\n",
                c.url(),
                c.source_type,
                c.change.added_count,
                c.change.removed_count
            ));
        }
        digest.push_str("\n# Raw Diffs\n\n");
        digest.push_str(&build_diffs_text(changes));
        Ok(digest)
    }
}

/// Retries transient failures of the wrapped summarizer with exponential
/// backoff. Other errors and the last transient error are returned as is.
pub struct RetryingSummarizer<S> {
    inner: S,
    max_attempts: u32,
    initial_backoff: Duration,
}

impl<S: Summarize> RetryingSummarizer<S> {
    pub fn new(inner: S, max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            initial_backoff,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn backoff(&self) -> ExponentialBackoff<backoff::SystemClock> {
        ExponentialBackoff {
            current_interval: self.initial_backoff,
            initial_interval: self.initial_backoff,
            max_interval: self.initial_backoff * 32,
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

#[async_trait]
impl<S: Summarize> Summarize for RetryingSummarizer<S> {
    fn name(&self) -> String {
        self.inner.name()
    }

    async fn summarize(&self, changes: &[EnrichedChange]) -> Result<String> {
        let mut backoff = self.backoff();
        let mut attempt = 1;

        loop {
            match self.inner.summarize(changes).await {
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let delay = backoff.next_backoff().unwrap_or(self.initial_backoff);
                    warn!(
                        "{} attempt {}/{} failed: {}, retrying in {:?}",
                        self.inner.name(),
                        attempt,
                        self.max_attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}
