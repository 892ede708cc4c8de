use anyhow::Context;
use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand};
use market_watch::config::{load_sites, Settings};
use market_watch::{
    Fetcher, MarketWatch, MockSummarizer, OpenAiSummarizer, RetryingSummarizer, RunOptions,
    RunStatus, SnapshotStore, Summarize,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "market-watch", version, about = "Weekly market and competitor change digest")]
struct Cli {
    /// SQLite database url (overrides DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch all sites, diff against history and write the report
    Run {
        /// Sites file (overrides SITES_FILE)
        #[arg(long)]
        sites: Option<PathBuf>,

        /// Markdown output directory (overrides REPORTS_DIR)
        #[arg(long)]
        reports_dir: Option<PathBuf>,

        /// Summarize every page as if it had no history (same as FORCE_SUMMARY=1)
        #[arg(long)]
        force_baseline: bool,

        /// Use the offline summarizer instead of the chat completions API
        #[arg(long)]
        mock_summarizer: bool,
    },
    /// Show stored snapshots for a url, newest first
    History {
        url: String,

        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Show the most recent reports
    Reports {
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
}

fn format_ts(ts: i64) -> String {
    Local
        .timestamp_opt(ts, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("market_watch=info,warn")),
        )
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::from_env();
    if let Some(database_url) = cli.database_url {
        settings.database_url = database_url;
    }

    let store = SnapshotStore::connect(&settings.database_url)
        .await
        .with_context(|| format!("opening database {}", settings.database_url))?;
    store.init().await.context("initializing schema")?;
    let store = Arc::new(store);

    match cli.command {
        Command::Run {
            sites,
            reports_dir,
            force_baseline,
            mock_summarizer,
        } => {
            let sites_path = sites.unwrap_or(settings.sites_path.clone());
            let sites = load_sites(&sites_path)?;
            info!("Loaded {} sites from {}", sites.len(), sites_path.display());

            let fetcher = Arc::new(Fetcher::new(settings.fetch.clone())?);
            let summarizer: Arc<dyn Summarize> = if mock_summarizer {
                Arc::new(MockSummarizer::default())
            } else {
                let config = settings.summarizer.clone();
                let attempts = config.max_attempts;
                let initial = Duration::from_millis(config.initial_backoff_millis);
                Arc::new(RetryingSummarizer::new(
                    OpenAiSummarizer::new(config)?,
                    attempts,
                    initial,
                ))
            };

            let options = RunOptions {
                reports_dir: reports_dir.unwrap_or(settings.reports_dir.clone()),
                force_baseline: force_baseline || settings.force_baseline,
                concurrency: settings.fetch.concurrency,
            };

            let watch = MarketWatch::new(store.clone(), fetcher, summarizer, options);
            let outcome = match watch.run_once(&sites).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Run failed: {}", e);
                    store.close().await;
                    return Err(e.into());
                }
            };

            println!("\nWeekly Market Watch Report\n{}\n", "=".repeat(32));
            println!("{}", outcome.report.content);
            println!(
                "\n(saved to SQLite as report {}, Markdown: {})",
                outcome.report.id,
                outcome.markdown_path.display()
            );
            if outcome.status == RunStatus::EmptyBatch {
                info!("No sources could be fetched this run");
            }
            if !outcome.sources_skipped.is_empty() {
                info!("Skipped sources: {}", outcome.sources_skipped.join(", "));
            }
        }
        Command::History { url, limit } => {
            let snapshots = store.history_for(&url, limit).await?;
            if snapshots.is_empty() {
                println!("No snapshots stored for {}", url);
            }
            for snapshot in snapshots {
                println!(
                    "#{} {} {} ({} lines)",
                    snapshot.id,
                    format_ts(snapshot.fetched_at),
                    snapshot.content_hash,
                    snapshot.text.lines().count()
                );
            }
        }
        Command::Reports { limit } => {
            for report in store.recent_reports(limit).await? {
                println!("--- Report #{} ({})", report.id, format_ts(report.created_at));
                println!("{}\n", report.content);
            }
        }
    }

    store.close().await;
    Ok(())
}
