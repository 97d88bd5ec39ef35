//! Storage errors

use thiserror::Error;

/// Errors from link or blob persistence
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt record for {url}: {reason}")]
    Corrupt { url: String, reason: String },

    #[error("Ordering column '{0}' is not available")]
    MissingOrderKey(&'static str),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
