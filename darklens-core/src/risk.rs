//! Keyword-based risk classification
//!
//! Deterministic scoring over the lower-cased title and content:
//! - two or more high-severity hits, or one high plus any medium hit, is `high`
//!   unless safe context is present and fewer than three high hits matched
//! - one high hit, or two or more medium hits, is `medium`
//! - anything else is `low`

use serde::Serialize;

use crate::{normalize_list, RiskScore, RiskVocabulary};

/// High-severity hit count at which safe context no longer downgrades
const SAFE_CONTEXT_CEILING: usize = 3;

/// Keywords that matched in each set, plus the resulting score
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    pub score: RiskScore,
    pub high: Vec<String>,
    pub medium: Vec<String>,
    pub safe: Vec<String>,
}

/// Risk classifier over an injected vocabulary
#[derive(Debug, Clone)]
pub struct RiskClassifier {
    high: Vec<String>,
    medium: Vec<String>,
    safe: Vec<String>,
}

impl RiskClassifier {
    pub fn new(vocabulary: &RiskVocabulary) -> Self {
        Self {
            high: normalize_list(vocabulary.high.clone()),
            medium: normalize_list(vocabulary.medium.clone()),
            safe: normalize_list(vocabulary.safe.clone()),
        }
    }

    /// Score a page
    pub fn classify(&self, title: &str, content: &str) -> RiskScore {
        self.classify_detailed(title, content).score
    }

    /// Score a page and report which keywords matched
    pub fn classify_detailed(&self, title: &str, content: &str) -> RiskAssessment {
        let text = format!("{} {}", title, content).to_lowercase();

        let high = matches(&self.high, &text);
        let medium = matches(&self.medium, &text);
        let safe = matches(&self.safe, &text);

        let score = decide(high.len(), medium.len(), safe.len());

        RiskAssessment {
            score,
            high,
            medium,
            safe,
        }
    }
}

fn matches(keywords: &[String], text: &str) -> Vec<String> {
    keywords
        .iter()
        .filter(|kw| text.contains(kw.as_str()))
        .cloned()
        .collect()
}

fn decide(high: usize, medium: usize, safe: usize) -> RiskScore {
    if high >= 2 || (high == 1 && medium >= 1) {
        if safe > 0 && high < SAFE_CONTEXT_CEILING {
            return RiskScore::Medium;
        }
        return RiskScore::High;
    }

    if high == 1 || medium >= 2 {
        return RiskScore::Medium;
    }

    RiskScore::Low
}
