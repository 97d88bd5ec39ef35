//! Per-URL outcomes and the session summary

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, warn};

/// Why the gate turned a URL away
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotHiddenService,
    DisallowedExtension,
    Visited,
    TooDeep,
    FailedDomain,
    CoolingDown,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::NotHiddenService => "not a hidden service",
            SkipReason::DisallowedExtension => "disallowed extension",
            SkipReason::Visited => "already visited",
            SkipReason::TooDeep => "beyond max depth",
            SkipReason::FailedDomain => "domain failed",
            SkipReason::CoolingDown => "cooling down",
        };
        f.write_str(s)
    }
}

/// Terminal state of one URL in a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlOutcome {
    /// Record merged and written; `links` were discovered on the page
    Persisted { links: usize },
    /// Rejected by the gate without a fetch
    Skipped(SkipReason),
    /// Timeout, unreachable host or error page; the domain was marked
    ConnectionFailure(String),
    /// A blocking dialog survived the retry
    DialogArtifact(String),
    /// Page had no visible text; `connection_marker` tells whether it
    /// also looked like a connection problem
    ContentEmpty { connection_marker: bool },
    /// Page fetched but the record could not be read or written
    StoreFailure(String),
    /// Anything else
    UnexpectedFailure(String),
}

impl UrlOutcome {
    pub fn is_fetched(&self) -> bool {
        matches!(
            self,
            UrlOutcome::Persisted { .. }
                | UrlOutcome::ContentEmpty { .. }
                | UrlOutcome::StoreFailure(_)
        )
    }
}

/// One processed work item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlVisit {
    pub url: String,
    pub depth: usize,
    pub outcome: UrlOutcome,
}

/// Counters for one crawl session
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlSummary {
    pub seeds: usize,
    pub fetched: usize,
    pub persisted: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
    pub connection_failures: usize,
    pub dialog_failures: usize,
    pub empty_pages: usize,
    pub unexpected_failures: usize,
    pub store_failures: usize,
    pub screenshot_failures: usize,
    pub failed_domains: Vec<String>,
}

impl CrawlSummary {
    pub fn record(&mut self, outcome: &UrlOutcome) {
        if outcome.is_fetched() {
            self.fetched += 1;
        }

        match outcome {
            UrlOutcome::Persisted { .. } => self.persisted += 1,
            UrlOutcome::Skipped(reason) => *self.skipped.entry(*reason).or_default() += 1,
            UrlOutcome::ConnectionFailure(_) => self.connection_failures += 1,
            UrlOutcome::DialogArtifact(_) => self.dialog_failures += 1,
            UrlOutcome::ContentEmpty { connection_marker } => {
                self.empty_pages += 1;
                if *connection_marker {
                    self.connection_failures += 1;
                }
            }
            UrlOutcome::StoreFailure(_) => self.store_failures += 1,
            UrlOutcome::UnexpectedFailure(_) => self.unexpected_failures += 1,
        }
    }

    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }

    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }

    /// Emit the end-of-session report
    pub fn log(&self) {
        info!(
            "Crawl finished: {} seeds, {} fetched, {} persisted, {} skipped, {} connection failures, {} empty, {} store failures, {} unexpected",
            self.seeds,
            self.fetched,
            self.persisted,
            self.skipped_total(),
            self.connection_failures,
            self.empty_pages,
            self.store_failures,
            self.unexpected_failures,
        );

        if !self.failed_domains.is_empty() {
            warn!(
                "{} failed domains: {}",
                self.failed_domains.len(),
                self.failed_domains.join(", ")
            );
        }
    }
}
