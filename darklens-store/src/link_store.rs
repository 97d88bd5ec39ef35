//! Link catalog persistence contract

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use darklens_core::LinkRecord;

use crate::StoreError;

/// Ordering applied when listing the active frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontierOrder {
    /// Newest first by creation time
    CreatedAtDesc,
    /// Newest first by row identifier
    IdDesc,
}

impl FrontierOrder {
    pub fn column(&self) -> &'static str {
        match self {
            FrontierOrder::CreatedAtDesc => "created_at",
            FrontierOrder::IdDesc => "id",
        }
    }
}

/// A seed row in the crawl frontier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontierEntry {
    pub id: i64,
    pub url: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A directory page harvested for new frontier links
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceEntry {
    pub id: i64,
    pub url: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_checked_at: Option<DateTime<Utc>>,
}

/// Whether an upsert created or replaced the row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Persistence for link records, the seed frontier and harvest sources
///
/// `upsert` is keyed by `url`. Implementations make the single write
/// atomic; a find-then-upsert sequence performed by a caller is only
/// best-effort when several writers touch the same URL concurrently.
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Look up the record for a URL
    async fn find_by_url(&self, url: &str) -> Result<Option<LinkRecord>, StoreError>;

    /// Insert the record, or replace the row with the same `url`
    async fn upsert(&self, record: &LinkRecord) -> Result<UpsertOutcome, StoreError>;

    /// Active seed URLs in the requested order
    async fn list_active_frontier(&self, order: FrontierOrder) -> Result<Vec<String>, StoreError>;

    /// Add a seed URL; returns false if it was already present
    async fn add_frontier(&self, url: &str, description: Option<&str>) -> Result<bool, StoreError>;

    /// Enable or disable a seed; returns false if the URL is unknown
    async fn set_frontier_active(&self, url: &str, active: bool) -> Result<bool, StoreError>;

    /// Records with the highest trending score first
    async fn top_trending(&self, limit: usize) -> Result<Vec<LinkRecord>, StoreError>;

    /// Active harvest sources, newest first
    async fn list_active_sources(&self) -> Result<Vec<SourceEntry>, StoreError>;

    /// Add a harvest source; returns false if it was already present
    async fn add_source(&self, url: &str, description: Option<&str>) -> Result<bool, StoreError>;

    /// Record the time a source was last harvested
    async fn mark_source_checked(&self, url: &str, at: DateTime<Utc>) -> Result<(), StoreError>;
}
