//! Crawl cycle loop
//!
//! Each cycle builds a fresh fetcher, optionally harvests the sources
//! into the frontier, loads the frontier and runs one session over it,
//! then sleeps. A failed cycle is logged and the loop carries on.

use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, error, info};
use uuid::Uuid;

use darklens_tor::{FetchError, PageFetcher};

use crate::{CrawlContext, CrawlSession, CrawlSummary, FrontierManager, Harvester, RuntimeError};

/// Builds the page fetcher for a cycle
pub type FetcherFactory = Arc<dyn Fn() -> Result<Arc<dyn PageFetcher>, FetchError> + Send + Sync>;

/// Repeats crawl sessions over the active frontier
pub struct Crawler {
    context: CrawlContext,
    frontier: FrontierManager,
    factory: FetcherFactory,
    harvest: bool,
}

impl Crawler {
    pub fn new<F>(context: CrawlContext, factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn PageFetcher>, FetchError> + Send + Sync + 'static,
    {
        let frontier = FrontierManager::new(context.store.clone());
        Self {
            context,
            frontier,
            factory: Arc::new(factory),
            harvest: false,
        }
    }

    /// Harvest sources into the frontier at the start of every cycle
    pub fn with_harvest(mut self, harvest: bool) -> Self {
        self.harvest = harvest;
        self
    }

    pub fn context(&self) -> &CrawlContext {
        &self.context
    }

    /// One session over the current frontier
    pub async fn run_cycle(&self) -> Result<CrawlSummary, RuntimeError> {
        let cycle = Uuid::new_v4();
        let fetcher = (self.factory)()?;

        if self.harvest {
            let context = self.context.clone();
            Harvester::new(
                self.context.store.clone(),
                fetcher.clone(),
                self.context.config.navigation_timeout,
            )
            .with_clock(move || context.now())
            .run()
            .await;
        }

        let seeds = self.frontier.load_frontier().await;
        if seeds.is_empty() {
            info!("Cycle {}: frontier is empty", cycle);
        } else {
            info!("Cycle {}: {} active seeds", cycle, seeds.len());
        }

        let mut session = CrawlSession::new(self.context.clone(), fetcher);
        Ok(session.run(&seeds).await)
    }

    /// Run cycles until `max_cycles` is reached, or forever
    ///
    /// Returns the number of cycles attempted.
    pub async fn run(&self, max_cycles: Option<usize>) -> usize {
        let interval = self.context.config.crawl_interval;
        let mut cycles = 0;

        loop {
            match self.run_cycle().await {
                Ok(summary) => debug!(
                    "Cycle done: {} persisted, {} failed domains",
                    summary.persisted,
                    summary.failed_domains.len()
                ),
                Err(e) => error!("Crawl cycle failed: {}", e),
            }

            cycles += 1;
            if max_cycles.is_some_and(|max| cycles >= max) {
                break;
            }

            debug!("Sleeping {:?} before next cycle", interval);
            sleep(interval).await;
        }

        cycles
    }
}
