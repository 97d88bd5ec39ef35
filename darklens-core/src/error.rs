//! Errors from the core crate

use thiserror::Error;

/// Errors raised while loading or validating core configuration data
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Failed to parse vocabulary: {0}")]
    VocabularyParse(#[from] toml::de::Error),

    #[error("Failed to read vocabulary file: {0}")]
    VocabularyIo(#[from] std::io::Error),

    #[error("Vocabulary list '{0}' is empty")]
    EmptyVocabulary(&'static str),

    #[error("Unknown risk score: {0}")]
    UnknownRiskScore(String),
}
