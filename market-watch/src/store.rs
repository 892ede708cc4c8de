use crate::types::{Page, Report, Result, Snapshot};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::str::FromStr;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS snapshots (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        url TEXT NOT NULL,
        fetched_at INTEGER NOT NULL,
        content_hash TEXT NOT NULL,
        text TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_snapshots_url_latest ON snapshots(url, fetched_at DESC, id DESC)",
    r#"
    CREATE TABLE IF NOT EXISTS reports (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        created_at INTEGER NOT NULL,
        content TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_reports_created_at ON reports(created_at)",
];

/// Append-only history of page snapshots and generated reports.
///
/// Construct once per process, call [`SnapshotStore::init`], then share by
/// reference. Rows are never updated or deleted.
pub struct SnapshotStore {
    db: SqlitePool,
    run_lock: Mutex<()>,
}

impl SnapshotStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let db = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        Ok(Self {
            db,
            run_lock: Mutex::new(()),
        })
    }

    /// Private in-memory database, gone when the store is dropped.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        // A single long-lived connection; every new connection to :memory:
        // would see its own empty database.
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(Self {
            db,
            run_lock: Mutex::new(()),
        })
    }

    pub async fn init(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(*statement).execute(&self.db).await?;
        }
        debug!("Snapshot store schema ready");
        Ok(())
    }

    /// Held by the pipeline across its read-latest / append sequence.
    pub async fn lock_run(&self) -> MutexGuard<'_, ()> {
        self.run_lock.lock().await
    }

    pub async fn append(&self, page: &Page) -> Result<()> {
        sqlx::query(
            "INSERT INTO snapshots (url, fetched_at, content_hash, text) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&page.url)
        .bind(page.fetched_at)
        .bind(&page.content_hash)
        .bind(&page.raw_text)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Store a run's pages in one transaction.
    pub async fn append_all(&self, pages: &[Page]) -> Result<usize> {
        let mut tx = self.db.begin().await?;

        for page in pages {
            sqlx::query(
                "INSERT INTO snapshots (url, fetched_at, content_hash, text) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(&page.url)
            .bind(page.fetched_at)
            .bind(&page.content_hash)
            .bind(&page.raw_text)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Stored {} snapshots", pages.len());
        Ok(pages.len())
    }

    /// Text of the most recent snapshot for each url, `""` when there is none.
    /// All lookups share one read transaction.
    pub async fn latest_text_for<'a, I>(&self, urls: I) -> Result<HashMap<String, String>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut tx = self.db.begin().await?;
        let mut latest = HashMap::new();

        for url in urls {
            let text: Option<String> = sqlx::query_scalar(
                r#"
                SELECT text FROM snapshots
                WHERE url = ?1
                ORDER BY fetched_at DESC, id DESC
                LIMIT 1
                "#,
            )
            .bind(url)
            .fetch_optional(&mut *tx)
            .await?;

            latest.insert(url.to_string(), text.unwrap_or_default());
        }

        tx.commit().await?;
        Ok(latest)
    }

    /// Snapshots for a url, newest first.
    pub async fn history_for(&self, url: &str, limit: usize) -> Result<Vec<Snapshot>> {
        let rows = sqlx::query(
            r#"
            SELECT id, url, fetched_at, content_hash, text FROM snapshots
            WHERE url = ?1
            ORDER BY fetched_at DESC, id DESC
            LIMIT ?2
            "#,
        )
        .bind(url)
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;

        let mut snapshots = Vec::with_capacity(rows.len());
        for row in rows {
            snapshots.push(Snapshot {
                id: row.try_get("id")?,
                url: row.try_get("url")?,
                fetched_at: row.try_get("fetched_at")?,
                content_hash: row.try_get("content_hash")?,
                text: row.try_get("text")?,
            });
        }
        Ok(snapshots)
    }

    pub async fn save_report(&self, created_at: i64, content: &str) -> Result<Report> {
        let result = sqlx::query("INSERT INTO reports (created_at, content) VALUES (?1, ?2)")
            .bind(created_at)
            .bind(content)
            .execute(&self.db)
            .await?;

        Ok(Report {
            id: result.last_insert_rowid(),
            created_at,
            content: content.to_string(),
        })
    }

    pub async fn recent_reports(&self, limit: usize) -> Result<Vec<Report>> {
        let rows = sqlx::query(
            "SELECT id, created_at, content FROM reports ORDER BY created_at DESC, id DESC LIMIT ?1",
        )
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;

        let mut reports = Vec::with_capacity(rows.len());
        for row in rows {
            reports.push(Report {
                id: row.try_get("id")?,
                created_at: row.try_get("created_at")?,
                content: row.try_get("content")?,
            });
        }
        Ok(reports)
    }

    pub async fn close(&self) {
        self.db.close().await;
    }
}
