//! In-memory link store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use darklens_core::LinkRecord;

use crate::{FrontierEntry, FrontierOrder, LinkStore, SourceEntry, StoreError, UpsertOutcome};

#[derive(Debug, Default)]
struct MemoryState {
    links: HashMap<String, LinkRecord>,
    frontier: Vec<FrontierEntry>,
    sources: Vec<SourceEntry>,
    next_id: i64,
}

/// Link store held entirely in process memory
#[derive(Debug, Default)]
pub struct MemoryLinkStore {
    state: Mutex<MemoryState>,
}

impl MemoryLinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a seed with an explicit creation time
    pub fn add_frontier_at(&self, url: &str, description: Option<&str>, created_at: DateTime<Utc>) -> bool {
        let mut state = self.state.lock();
        if state.frontier.iter().any(|e| e.url == url) {
            return false;
        }

        state.next_id += 1;
        let id = state.next_id;
        state.frontier.push(FrontierEntry {
            id,
            url: url.to_string(),
            description: description.map(str::to_string),
            is_active: true,
            created_at,
        });
        true
    }

    /// Add a harvest source with an explicit creation time
    pub fn add_source_at(&self, url: &str, description: Option<&str>, created_at: DateTime<Utc>) -> bool {
        let mut state = self.state.lock();
        if state.sources.iter().any(|e| e.url == url) {
            return false;
        }

        state.next_id += 1;
        let id = state.next_id;
        state.sources.push(SourceEntry {
            id,
            url: url.to_string(),
            description: description.map(str::to_string),
            is_active: true,
            created_at,
            last_checked_at: None,
        });
        true
    }

    /// Snapshot of every harvest source
    pub fn sources(&self) -> Vec<SourceEntry> {
        self.state.lock().sources.clone()
    }

    /// Number of stored link records
    pub fn len(&self) -> usize {
        self.state.lock().links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every stored record
    pub fn records(&self) -> Vec<LinkRecord> {
        self.state.lock().links.values().cloned().collect()
    }
}

#[async_trait]
impl LinkStore for MemoryLinkStore {
    async fn find_by_url(&self, url: &str) -> Result<Option<LinkRecord>, StoreError> {
        Ok(self.state.lock().links.get(url).cloned())
    }

    async fn upsert(&self, record: &LinkRecord) -> Result<UpsertOutcome, StoreError> {
        let mut state = self.state.lock();
        let outcome = match state.links.entry(record.url.clone()) {
            Entry::Occupied(mut slot) => {
                // Liveness flags belong to the liveness checker
                let existing = slot.get_mut();
                let (status, is_active) = (existing.status, existing.is_active);
                *existing = record.clone();
                existing.status = status;
                existing.is_active = is_active;
                UpsertOutcome::Updated
            }
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                UpsertOutcome::Inserted
            }
        };
        Ok(outcome)
    }

    async fn list_active_frontier(&self, order: FrontierOrder) -> Result<Vec<String>, StoreError> {
        let state = self.state.lock();
        let mut active: Vec<&FrontierEntry> = state.frontier.iter().filter(|e| e.is_active).collect();

        match order {
            FrontierOrder::CreatedAtDesc => {
                active.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)))
            }
            FrontierOrder::IdDesc => active.sort_by(|a, b| b.id.cmp(&a.id)),
        }

        Ok(active.into_iter().map(|e| e.url.clone()).collect())
    }

    async fn add_frontier(&self, url: &str, description: Option<&str>) -> Result<bool, StoreError> {
        Ok(self.add_frontier_at(url, description, Utc::now()))
    }

    async fn set_frontier_active(&self, url: &str, active: bool) -> Result<bool, StoreError> {
        let mut state = self.state.lock();
        match state.frontier.iter_mut().find(|e| e.url == url) {
            Some(entry) => {
                entry.is_active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn top_trending(&self, limit: usize) -> Result<Vec<LinkRecord>, StoreError> {
        let mut records = self.records();
        records.sort_by(|a, b| b.trending_score.cmp(&a.trending_score).then(a.url.cmp(&b.url)));
        records.truncate(limit);
        Ok(records)
    }

    async fn list_active_sources(&self) -> Result<Vec<SourceEntry>, StoreError> {
        let state = self.state.lock();
        let mut active: Vec<SourceEntry> = state.sources.iter().filter(|e| e.is_active).cloned().collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(active)
    }

    async fn add_source(&self, url: &str, description: Option<&str>) -> Result<bool, StoreError> {
        Ok(self.add_source_at(url, description, Utc::now()))
    }

    async fn mark_source_checked(&self, url: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        if let Some(entry) = state.sources.iter_mut().find(|e| e.url == url) {
            entry.last_checked_at = Some(at);
        }
        Ok(())
    }
}
