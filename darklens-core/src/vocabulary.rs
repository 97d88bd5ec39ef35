//! Keyword vocabularies for risk scoring and tagging
//!
//! Vocabularies are immutable configuration data handed to the
//! classifier and tag extractor. The built-in lists can be replaced by a
//! TOML file of the form:
//!
//! ```toml
//! [risk]
//! high = ["exploit", "stolen"]
//! medium = ["forum", "market"]
//! safe = ["university"]
//!
//! [tags]
//! keywords = ["bitcoin", "market"]
//! ```

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::CoreError;

const HIGH_RISK_KEYWORDS: &[&str] = &[
    "drugs", "hack", "exploit", "carding", "malware", "ransom", "porn", "counterfeit",
    "weapon", "kill", "murder", "hitman", "child", "illegal", "stolen", "credit card",
    "bank", "scam", "phishing", "fraud", "bitcoin", "crypto", "forged", "passport", "ssn",
    "id", "dox", "leak", "dump", "zero day", "botnet", "rootkit", "keylogger", "rat",
    "shell", "backdoor", "terror", "bomb", "assassinate",
];

const MEDIUM_RISK_KEYWORDS: &[&str] = &[
    "forum", "market", "shop", "exchange", "vpn", "proxy", "privacy", "anonymity", "escrow",
    "wallet", "mix", "launder", "casino", "bet", "gamble", "adult", "escort", "dating",
    "pharma", "pill", "gun", "firearm", "ammo", "counterfeit", "piracy", "torrent", "crack",
    "serial", "keygen", "license", "dump", "database", "breach", "leak", "card", "bank",
    "account", "money", "bitcoin", "crypto",
];

const SAFE_CONTEXT_KEYWORDS: &[&str] = &[
    "conference", "university", "college", "engineering", "debian", "event", "workshop",
    "talk", "foundation", "project", "open source", "free software", "linux", "gnu",
    "registration", "participant", "schedule", "contact", "blog", "wiki", "venue", "about",
    "support", "volunteer",
];

const TAG_KEYWORDS: &[&str] = &[
    "drugs", "bitcoin", "crypto", "market", "carding", "hacking", "fraud", "phishing",
    "counterfeit", "passport", "weed", "cocaine", "heroin", "ecstasy", "steroids", "gun",
    "firearm", "explosives", "malware", "ransomware", "porn", "escort", "forged",
    "credit card", "bank", "atm", "skimmer", "vpn", "anonymity", "tor", "privacy",
];

/// Keyword sets used by the risk classifier
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RiskVocabulary {
    pub high: Vec<String>,
    pub medium: Vec<String>,
    #[serde(default)]
    pub safe: Vec<String>,
}

/// Keyword set used by the tag extractor
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TagVocabulary {
    pub keywords: Vec<String>,
}

/// Complete keyword configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Vocabulary {
    pub risk: RiskVocabulary,
    pub tags: TagVocabulary,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            risk: RiskVocabulary {
                high: owned(HIGH_RISK_KEYWORDS),
                medium: owned(MEDIUM_RISK_KEYWORDS),
                safe: owned(SAFE_CONTEXT_KEYWORDS),
            },
            tags: TagVocabulary {
                keywords: owned(TAG_KEYWORDS),
            },
        }
    }
}

impl Vocabulary {
    /// Parse a vocabulary from TOML and normalize it
    pub fn from_toml_str(s: &str) -> Result<Self, CoreError> {
        let vocabulary: Vocabulary = toml::from_str(s)?;
        vocabulary.normalized()
    }

    /// Load a vocabulary from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Lower-case, trim and de-duplicate every list, keeping first occurrences
    pub fn normalized(self) -> Result<Self, CoreError> {
        let vocabulary = Self {
            risk: RiskVocabulary {
                high: normalize_list(self.risk.high),
                medium: normalize_list(self.risk.medium),
                safe: normalize_list(self.risk.safe),
            },
            tags: TagVocabulary {
                keywords: normalize_list(self.tags.keywords),
            },
        };

        if vocabulary.risk.high.is_empty() {
            return Err(CoreError::EmptyVocabulary("risk.high"));
        }
        if vocabulary.tags.keywords.is_empty() {
            return Err(CoreError::EmptyVocabulary("tags.keywords"));
        }

        Ok(vocabulary)
    }
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

pub(crate) fn normalize_list(words: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    words
        .into_iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty() && seen.insert(w.clone()))
        .collect()
}
