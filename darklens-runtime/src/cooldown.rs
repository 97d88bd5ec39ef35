//! Cool-down guard
//!
//! A URL crawled less than the cool-down window ago is not fetched
//! again, whichever seed leads back to it.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use darklens_store::LinkStore;

/// Re-crawl gate backed by the link store
#[derive(Clone)]
pub struct CooldownGuard {
    store: Arc<dyn LinkStore>,
    window: Duration,
}

impl CooldownGuard {
    pub fn new(store: Arc<dyn LinkStore>, window: Duration) -> Self {
        Self { store, window }
    }

    /// Whether `url` was crawled too recently
    ///
    /// A failed lookup lets the crawl proceed.
    pub async fn should_skip(&self, url: &str, now: DateTime<Utc>) -> bool {
        match self.store.find_by_url(url).await {
            Ok(Some(record)) => {
                let age = now - record.last_crawled_at;
                let skip = age < self.window;
                if skip {
                    debug!("{} crawled {}m ago, cooling down", url, age.num_minutes());
                }
                skip
            }
            Ok(None) => false,
            Err(e) => {
                warn!("Cool-down lookup failed for {}: {}", url, e);
                false
            }
        }
    }
}
