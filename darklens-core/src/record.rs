//! Persisted link records and crawl observations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::CoreError;

/// Risk tier assigned to a crawled page
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskScore {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskScore {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskScore::Low => "low",
            RiskScore::Medium => "medium",
            RiskScore::High => "high",
        }
    }
}

impl fmt::Display for RiskScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskScore {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskScore::Low),
            "medium" => Ok(RiskScore::Medium),
            "high" => Ok(RiskScore::High),
            other => Err(CoreError::UnknownRiskScore(other.to_string())),
        }
    }
}

/// One catalog entry per canonical URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Canonical URL (merge key)
    pub url: String,
    /// Page title, may be empty
    pub title: String,
    /// Visible text of the most recent crawl
    pub content: String,
    pub risk_score: RiskScore,
    pub tags: BTreeSet<String>,
    /// Reference into the blob store, if a capture was stored
    pub screenshot_ref: Option<String>,
    /// Referring URLs in order of first appearance, unique by value
    pub source_urls: Vec<String>,
    /// Always `source_urls.len()`
    pub source_count: usize,
    pub trending_score: i64,
    /// Time of the most recent successful fetch
    pub last_crawled_at: DateTime<Utc>,
    /// Liveness status owned by the external liveness checker
    pub status: Option<u16>,
    /// Liveness flag owned by the external liveness checker
    pub is_active: bool,
}

/// Everything learned about a URL from one successful crawl
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub url: String,
    /// The URL that led the crawler here
    pub source_url: String,
    pub title: String,
    pub content: String,
    pub risk_score: RiskScore,
    pub tags: BTreeSet<String>,
    pub screenshot_ref: Option<String>,
    pub now: DateTime<Utc>,
}
