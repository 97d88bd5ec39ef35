//! Runtime errors

use thiserror::Error;

use darklens_tor::FetchError;

/// Errors that abort a crawl cycle before it starts
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Page fetcher unavailable: {0}")]
    Fetcher(#[from] FetchError),
}
