//! Crawler configuration

use std::time::Duration;

use darklens_core::{COOLDOWN_HOURS, DEFAULT_DISALLOWED_EXTENSIONS, DEFAULT_MAX_DEPTH};

/// Knobs for crawl sessions and the cycle loop
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Deepest hop below a seed that is still fetched
    pub max_depth: usize,
    /// Pause between crawl cycles
    pub crawl_interval: Duration,
    /// Limit for a single navigation
    pub navigation_timeout: Duration,
    /// Minimum age of a record before its URL is crawled again
    pub cooldown: chrono::Duration,
    /// URL path suffixes that are never fetched
    pub disallowed_extensions: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            crawl_interval: Duration::from_secs(10),
            navigation_timeout: Duration::from_secs(60),
            cooldown: chrono::Duration::hours(COOLDOWN_HOURS),
            disallowed_extensions: DEFAULT_DISALLOWED_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl CrawlerConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_crawl_interval(mut self, interval: Duration) -> Self {
        self.crawl_interval = interval;
        self
    }

    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }
}
