//! Multi-source record merging
//!
//! Folds a new crawl observation into the previously persisted state of
//! the same URL. Only the latest content snapshot is kept; the referrer
//! list grows as a set in order of first appearance.

use chrono::{DateTime, Utc};

use crate::{LinkRecord, Observation, SOURCE_WEIGHT_MS};

/// Trending score for a record seen by `source_count` referrers at `now`
///
/// Non-decreasing in both `now` and `source_count`.
pub fn trending_score(now: DateTime<Utc>, source_count: usize) -> i64 {
    let sources = i64::try_from(source_count).unwrap_or(i64::MAX);
    now.timestamp_millis()
        .saturating_add(sources.saturating_mul(SOURCE_WEIGHT_MS))
}

/// Compute the record to persist after a successful crawl
pub fn merge(existing: Option<&LinkRecord>, observation: &Observation) -> LinkRecord {
    let (source_urls, status, is_active) = match existing {
        Some(prev) => {
            let mut sources = dedup_sources(&prev.source_urls);
            if !sources.contains(&observation.source_url) {
                sources.push(observation.source_url.clone());
            }
            (sources, prev.status, prev.is_active)
        }
        None => (vec![observation.source_url.clone()], None, true),
    };

    let source_count = source_urls.len();

    LinkRecord {
        url: observation.url.clone(),
        title: observation.title.clone(),
        content: observation.content.clone(),
        risk_score: observation.risk_score,
        tags: observation.tags.clone(),
        screenshot_ref: observation.screenshot_ref.clone(),
        source_urls,
        source_count,
        trending_score: trending_score(observation.now, source_count),
        last_crawled_at: observation.now,
        status,
        is_active,
    }
}

/// Drop repeated referrers a foreign writer may have left behind
fn dedup_sources(sources: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(sources.len() + 1);
    for source in sources {
        if !out.contains(source) {
            out.push(source.clone());
        }
    }
    out
}
