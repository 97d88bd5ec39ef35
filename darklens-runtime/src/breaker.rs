//! Domain failure breaker
//!
//! Once one URL of a base domain fails to connect, every other URL of
//! that domain is skipped for the rest of the session.

use dashmap::DashSet;
use std::sync::Arc;
use tracing::warn;

use darklens_core::base_domain;

/// Set of unreachable base domains
///
/// Clones share the same set.
#[derive(Debug, Clone, Default)]
pub struct DomainBreaker {
    failed: Arc<DashSet<String>>,
}

impl DomainBreaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the breaker for the URL's base domain
    pub fn mark_failed(&self, url: &str) {
        let domain = base_domain(url);
        if self.failed.insert(domain.clone()) {
            warn!("Marking domain as failed: {}", domain);
        }
    }

    /// Whether the URL's base domain has failed
    pub fn is_failed(&self, url: &str) -> bool {
        self.failed.contains(&base_domain(url))
    }

    /// Failed domains, sorted
    pub fn failed_domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = self.failed.iter().map(|d| d.key().clone()).collect();
        domains.sort();
        domains
    }

    pub fn len(&self) -> usize {
        self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failed.is_empty()
    }
}
