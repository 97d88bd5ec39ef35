//! SQLite-backed link store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use darklens_core::{LinkRecord, RiskScore};

use crate::{FrontierEntry, FrontierOrder, LinkStore, SourceEntry, StoreError, UpsertOutcome};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS onion_links (
    url TEXT PRIMARY KEY,
    title TEXT NOT NULL DEFAULT '',
    content TEXT NOT NULL DEFAULT '',
    risk_score TEXT NOT NULL CHECK(risk_score IN ('low', 'medium', 'high')),
    tags TEXT NOT NULL DEFAULT '[]',           -- JSON array
    screenshot_url TEXT,
    source_urls TEXT NOT NULL DEFAULT '[]',    -- JSON array
    source_count INTEGER NOT NULL DEFAULT 0,
    trending_score INTEGER NOT NULL DEFAULT 0,
    last_crawled_at INTEGER NOT NULL,          -- epoch millis
    status INTEGER,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_onion_links_trending ON onion_links(trending_score DESC);

CREATE TABLE IF NOT EXISTS fetched_onion_links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    description TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS onion_sources (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    description TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL,
    last_checked_at INTEGER
);
";

const LINK_COLUMNS: &str = "url, title, content, risk_score, tags, screenshot_url, source_urls, \
    source_count, trending_score, last_crawled_at, status, is_active";

/// Row as read from SQLite, before JSON and enum decoding
struct RawLink {
    url: String,
    title: String,
    content: String,
    risk_score: String,
    tags: String,
    screenshot_url: Option<String>,
    source_urls: String,
    source_count: i64,
    trending_score: i64,
    last_crawled_at: i64,
    status: Option<i64>,
    is_active: bool,
}

impl RawLink {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            url: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            risk_score: row.get(3)?,
            tags: row.get(4)?,
            screenshot_url: row.get(5)?,
            source_urls: row.get(6)?,
            source_count: row.get(7)?,
            trending_score: row.get(8)?,
            last_crawled_at: row.get(9)?,
            status: row.get(10)?,
            is_active: row.get(11)?,
        })
    }

    fn into_record(self) -> Result<LinkRecord, StoreError> {
        let corrupt = |reason: String| StoreError::Corrupt {
            url: self.url.clone(),
            reason,
        };

        let risk_score: RiskScore = self.risk_score.parse().map_err(|e| corrupt(format!("{}", e)))?;
        let tags: BTreeSet<String> = serde_json::from_str(&self.tags)?;
        let source_urls: Vec<String> = serde_json::from_str(&self.source_urls)?;
        let last_crawled_at = DateTime::<Utc>::from_timestamp_millis(self.last_crawled_at)
            .ok_or_else(|| corrupt(format!("bad timestamp {}", self.last_crawled_at)))?;
        let status = match self.status {
            Some(code) => Some(u16::try_from(code).map_err(|_| corrupt(format!("bad status {}", code)))?),
            None => None,
        };

        if usize::try_from(self.source_count).ok() != Some(source_urls.len()) {
            tracing::warn!(
                "Stored source_count {} for {} disagrees with {} source URLs",
                self.source_count,
                self.url,
                source_urls.len()
            );
        }

        Ok(LinkRecord {
            source_count: source_urls.len(),
            url: self.url,
            title: self.title,
            content: self.content,
            risk_score,
            tags,
            screenshot_ref: self.screenshot_url,
            source_urls,
            trending_score: self.trending_score,
            last_crawled_at,
            status,
            is_active: self.is_active,
        })
    }
}

/// Link store persisted in a SQLite database
///
/// Every statement runs on tokio's blocking pool so a slow disk never
/// stalls the crawler's async workers.
pub struct SqliteLinkStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLinkStore {
    /// Open (or create) a database file
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;
        Self::with_connection(conn)
    }

    /// Private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool
    async fn call<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock();
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("database task failed: {}", e)))?
    }

    /// Every frontier row, newest first
    pub async fn frontier_entries(&self) -> Result<Vec<FrontierEntry>, StoreError> {
        self.call(|conn| frontier_entries(conn)).await
    }
}

fn millis_to_time(url: &str, millis: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| StoreError::Corrupt {
        url: url.to_string(),
        reason: format!("bad timestamp {}", millis),
    })
}

fn find_link(conn: &Connection, url: &str) -> Result<Option<LinkRecord>, StoreError> {
    let raw = conn
        .query_row(
            &format!("SELECT {} FROM onion_links WHERE url = ?1", LINK_COLUMNS),
            params![url],
            RawLink::from_row,
        )
        .optional()?;

    raw.map(RawLink::into_record).transpose()
}

fn upsert_link(conn: &mut Connection, record: &LinkRecord) -> Result<UpsertOutcome, StoreError> {
    let tags = serde_json::to_string(&record.tags)?;
    let source_urls = serde_json::to_string(&record.source_urls)?;
    let now = Utc::now().timestamp_millis();

    let tx = conn.transaction()?;

    let existed = tx
        .query_row("SELECT 1 FROM onion_links WHERE url = ?1", params![record.url], |_| Ok(()))
        .optional()?
        .is_some();

    // status and is_active are owned by the liveness checker and left alone on update
    tx.execute(
        "INSERT INTO onion_links (
            url, title, content, risk_score, tags, screenshot_url, source_urls,
            source_count, trending_score, last_crawled_at, status, is_active,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
        ON CONFLICT(url) DO UPDATE SET
            title = excluded.title,
            content = excluded.content,
            risk_score = excluded.risk_score,
            tags = excluded.tags,
            screenshot_url = excluded.screenshot_url,
            source_urls = excluded.source_urls,
            source_count = excluded.source_count,
            trending_score = excluded.trending_score,
            last_crawled_at = excluded.last_crawled_at,
            updated_at = excluded.updated_at",
        params![
            record.url,
            record.title,
            record.content,
            record.risk_score.as_str(),
            tags,
            record.screenshot_ref,
            source_urls,
            record.source_urls.len() as i64,
            record.trending_score,
            record.last_crawled_at.timestamp_millis(),
            record.status.map(i64::from),
            record.is_active,
            now,
        ],
    )?;

    tx.commit()?;

    Ok(if existed {
        UpsertOutcome::Updated
    } else {
        UpsertOutcome::Inserted
    })
}

fn list_frontier(conn: &Connection, order: FrontierOrder) -> Result<Vec<String>, StoreError> {
    let order_by = match order {
        FrontierOrder::CreatedAtDesc => "created_at DESC, id DESC",
        FrontierOrder::IdDesc => "id DESC",
    };
    let sql = format!(
        "SELECT url FROM fetched_onion_links WHERE is_active = 1 ORDER BY {}",
        order_by
    );

    let mut stmt = conn.prepare(&sql).map_err(|e| missing_column(e, order))?;
    let urls = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| missing_column(e, order))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(urls)
}

fn add_frontier(conn: &Connection, url: &str, description: Option<&str>) -> Result<bool, StoreError> {
    let changed = conn.execute(
        "INSERT INTO fetched_onion_links (url, description, is_active, created_at)
         VALUES (?1, ?2, 1, ?3)
         ON CONFLICT(url) DO NOTHING",
        params![url, description, Utc::now().timestamp_millis()],
    )?;
    Ok(changed > 0)
}

fn set_frontier_active(conn: &Connection, url: &str, active: bool) -> Result<bool, StoreError> {
    let changed = conn.execute(
        "UPDATE fetched_onion_links SET is_active = ?1 WHERE url = ?2",
        params![active, url],
    )?;
    Ok(changed > 0)
}

fn frontier_entries(conn: &Connection) -> Result<Vec<FrontierEntry>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, url, description, is_active, created_at
         FROM fetched_onion_links ORDER BY created_at DESC, id DESC",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, bool>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|(id, url, description, is_active, created_at)| {
            let created_at = millis_to_time(&url, created_at)?;
            Ok(FrontierEntry {
                id,
                url,
                description,
                is_active,
                created_at,
            })
        })
        .collect()
}

fn top_trending(conn: &Connection, limit: usize) -> Result<Vec<LinkRecord>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM onion_links ORDER BY trending_score DESC, url ASC LIMIT ?1",
        LINK_COLUMNS
    ))?;

    let raws = stmt
        .query_map(params![limit as i64], RawLink::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    raws.into_iter().map(RawLink::into_record).collect()
}

fn list_sources(conn: &Connection) -> Result<Vec<SourceEntry>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, url, description, created_at, last_checked_at
         FROM onion_sources WHERE is_active = 1 ORDER BY created_at DESC, id DESC",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, Option<i64>>(4)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|(id, url, description, created_at, last_checked_at)| {
            let created_at = millis_to_time(&url, created_at)?;
            let last_checked_at = match last_checked_at {
                Some(millis) => Some(millis_to_time(&url, millis)?),
                None => None,
            };
            Ok(SourceEntry {
                id,
                url,
                description,
                is_active: true,
                created_at,
                last_checked_at,
            })
        })
        .collect()
}

fn add_source(conn: &Connection, url: &str, description: Option<&str>) -> Result<bool, StoreError> {
    let changed = conn.execute(
        "INSERT INTO onion_sources (url, description, is_active, created_at)
         VALUES (?1, ?2, 1, ?3)
         ON CONFLICT(url) DO NOTHING",
        params![url, description, Utc::now().timestamp_millis()],
    )?;
    Ok(changed > 0)
}

fn mark_source_checked(conn: &Connection, url: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
    conn.execute(
        "UPDATE onion_sources SET last_checked_at = ?1 WHERE url = ?2",
        params![at.timestamp_millis(), url],
    )?;
    Ok(())
}

/// Map "no such column" on the ordering key to `MissingOrderKey`
fn missing_column(err: rusqlite::Error, order: FrontierOrder) -> StoreError {
    if err.to_string().contains("no such column") {
        StoreError::MissingOrderKey(order.column())
    } else {
        StoreError::Sqlite(err)
    }
}

#[async_trait]
impl LinkStore for SqliteLinkStore {
    async fn find_by_url(&self, url: &str) -> Result<Option<LinkRecord>, StoreError> {
        let url = url.to_string();
        self.call(move |conn| find_link(conn, &url)).await
    }

    async fn upsert(&self, record: &LinkRecord) -> Result<UpsertOutcome, StoreError> {
        let record = record.clone();
        self.call(move |conn| upsert_link(conn, &record)).await
    }

    async fn list_active_frontier(&self, order: FrontierOrder) -> Result<Vec<String>, StoreError> {
        self.call(move |conn| list_frontier(conn, order)).await
    }

    async fn add_frontier(&self, url: &str, description: Option<&str>) -> Result<bool, StoreError> {
        let url = url.to_string();
        let description = description.map(str::to_string);
        self.call(move |conn| add_frontier(conn, &url, description.as_deref())).await
    }

    async fn set_frontier_active(&self, url: &str, active: bool) -> Result<bool, StoreError> {
        let url = url.to_string();
        self.call(move |conn| set_frontier_active(conn, &url, active)).await
    }

    async fn top_trending(&self, limit: usize) -> Result<Vec<LinkRecord>, StoreError> {
        self.call(move |conn| top_trending(conn, limit)).await
    }

    async fn list_active_sources(&self) -> Result<Vec<SourceEntry>, StoreError> {
        self.call(|conn| list_sources(conn)).await
    }

    async fn add_source(&self, url: &str, description: Option<&str>) -> Result<bool, StoreError> {
        let url = url.to_string();
        let description = description.map(str::to_string);
        self.call(move |conn| add_source(conn, &url, description.as_deref())).await
    }

    async fn mark_source_checked(&self, url: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        let url = url.to_string();
        self.call(move |conn| mark_source_checked(conn, &url, at)).await
    }
}
