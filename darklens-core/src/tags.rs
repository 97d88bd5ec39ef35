//! Keyword tag extraction

use std::collections::BTreeSet;

use crate::{normalize_list, TagVocabulary};

/// Tags every page with the vocabulary keywords it mentions
#[derive(Debug, Clone)]
pub struct TagExtractor {
    keywords: Vec<String>,
}

impl TagExtractor {
    pub fn new(vocabulary: &TagVocabulary) -> Self {
        Self {
            keywords: normalize_list(vocabulary.keywords.clone()),
        }
    }

    /// Every keyword appearing as a case-insensitive substring of `content`
    pub fn extract_tags(&self, content: &str) -> BTreeSet<String> {
        if content.is_empty() {
            return BTreeSet::new();
        }

        let lower = content.to_lowercase();
        self.keywords
            .iter()
            .filter(|kw| lower.contains(kw.as_str()))
            .cloned()
            .collect()
    }
}
