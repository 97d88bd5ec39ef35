//! Source harvesting
//!
//! Directory pages registered as harvest sources are fetched newest
//! first. Every onion link they mention, as an anchor or as bare text,
//! is normalized and added to the crawl frontier.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use darklens_core::find_onion_urls;
use darklens_store::{LinkStore, SourceEntry};
use darklens_tor::{check_page, normalize_harvested_link, FetchError, PageFetcher};

use crate::Clock;

/// Counters of one harvest pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HarvestSummary {
    pub sources: usize,
    pub harvested: usize,
    pub failed_sources: usize,
    pub discovered: usize,
    pub inserted: usize,
    pub rejected: usize,
    pub store_failures: usize,
}

/// Feeds the frontier from harvest sources
pub struct Harvester {
    store: Arc<dyn LinkStore>,
    fetcher: Arc<dyn PageFetcher>,
    navigation_timeout: Duration,
    clock: Clock,
}

impl Harvester {
    pub fn new(store: Arc<dyn LinkStore>, fetcher: Arc<dyn PageFetcher>, navigation_timeout: Duration) -> Self {
        Self {
            store,
            fetcher,
            navigation_timeout,
            clock: Arc::new(chrono::Utc::now),
        }
    }

    /// Replace the wall clock
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> chrono::DateTime<chrono::Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Harvest every active source once
    pub async fn run(&self) -> HarvestSummary {
        let mut summary = HarvestSummary::default();

        let sources = match self.store.list_active_sources().await {
            Ok(sources) => sources,
            Err(e) => {
                warn!("Failed to load harvest sources: {}", e);
                return summary;
            }
        };
        summary.sources = sources.len();
        info!("Harvesting {} sources", sources.len());

        for source in &sources {
            match self.harvest_source(source, &mut summary).await {
                Ok(inserted) => {
                    summary.harvested += 1;
                    info!("Harvested {}: {} new frontier links", source.url, inserted);
                    let now = (self.clock)();
                    if let Err(e) = self.store.mark_source_checked(&source.url, now).await {
                        warn!("Failed to update check time of {}: {}", source.url, e);
                    }
                }
                Err(e) => {
                    summary.failed_sources += 1;
                    warn!("Harvest of {} failed: {}", source.url, e);
                }
            }
        }

        info!(
            "Harvest complete: {}/{} sources, {} links found, {} added to frontier",
            summary.harvested, summary.sources, summary.discovered, summary.inserted
        );
        summary
    }

    async fn harvest_source(&self, source: &SourceEntry, summary: &mut HarvestSummary) -> Result<usize, FetchError> {
        let page = self.fetcher.navigate(&source.url, self.navigation_timeout).await?;
        check_page(&page)?;

        let anchors = self.fetcher.extract_links(&page);
        let mentioned = find_onion_urls(&page.html);
        debug!(
            "{}: {} anchors, {} onion mentions",
            source.url,
            anchors.len(),
            mentioned.len()
        );

        let (links, rejected) = collect_links(anchors.into_iter().chain(mentioned));
        summary.discovered += links.len();
        summary.rejected += rejected;

        let description = format!("harvested from {}", source.url);
        let mut inserted = 0;
        for link in &links {
            match self.store.add_frontier(link, Some(&description)).await {
                Ok(true) => {
                    debug!("Frontier += {}", link);
                    inserted += 1;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!("Failed to add {} to frontier: {}", link, e);
                    summary.store_failures += 1;
                }
            }
        }

        summary.inserted += inserted;
        Ok(inserted)
    }
}

/// Normalize and dedupe raw links, keeping first-seen order
///
/// Returns the kept links and the number rejected by normalization.
pub fn collect_links<I>(raw: I) -> (Vec<String>, usize)
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    let mut links = Vec::new();
    let mut rejected = 0;

    for link in raw {
        match normalize_harvested_link(&link) {
            Some(link) => {
                if seen.insert(link.clone()) {
                    links.push(link);
                }
            }
            None => rejected += 1,
        }
    }

    (links, rejected)
}
