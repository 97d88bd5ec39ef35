//! Page fetching
//!
//! `PageFetcher` is the browser-like capability a crawl session drives.
//! `TorPageFetcher` implements it over the Tor SOCKS proxy.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::{create_tor_client, html, TorConfig};

/// Errors raised while fetching a page
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Navigation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Host unreachable: {0}")]
    Unreachable(String),

    #[error("Blocking dialog: {0}")]
    Dialog(String),

    #[error("Reached error page: {0}")]
    ErrorPage(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("Screenshot failed: {0}")]
    Screenshot(String),

    #[error("Fetch failed: {0}")]
    Other(String),
}

impl FetchError {
    /// Timeout, unreachable host or error page
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            FetchError::Timeout(_) | FetchError::Unreachable(_) | FetchError::ErrorPage(_)
        )
    }

    /// Classify a transport error
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            return FetchError::Timeout(timeout);
        }
        if err.is_connect() {
            return FetchError::Unreachable(err.to_string());
        }
        if err.is_builder() {
            return FetchError::Client(err.to_string());
        }

        // SOCKS failures for dead onions surface as generic request errors
        let message = format!("{:?}", err).to_lowercase();
        let unreachable = ["socks", "connection refused", "dns", "host unreachable", "timed out"];
        if unreachable.iter().any(|m| message.contains(m)) {
            FetchError::Unreachable(err.to_string())
        } else {
            FetchError::Other(err.to_string())
        }
    }
}

/// A navigated document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// URL the navigation was asked for
    pub requested_url: String,
    /// URL after redirects
    pub final_url: String,
    /// HTTP status, when the transport has one
    pub status: Option<u16>,
    /// Raw document
    pub html: String,
}

/// A page capture ready for the blob store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screenshot {
    pub bytes: Vec<u8>,
    /// File extension without the dot
    pub extension: &'static str,
}

/// Browser-like page access
///
/// Interstitial dialogs are dismissed before `navigate` returns; one
/// that cannot be dismissed surfaces as `FetchError::Dialog`.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Load `url`, giving up after `timeout`
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<FetchedPage, FetchError>;

    /// Capture the loaded page
    async fn capture_screenshot(&self, page: &FetchedPage) -> Result<Screenshot, FetchError>;

    fn extract_visible_text(&self, page: &FetchedPage) -> String {
        html::extract_visible_text(&page.html)
    }

    fn extract_title(&self, page: &FetchedPage) -> String {
        html::extract_title(&page.html)
    }

    /// Hidden-service links resolved against the final URL
    fn extract_links(&self, page: &FetchedPage) -> Vec<String> {
        html::extract_links(&page.html, &page.final_url)
    }
}

/// Fetcher that speaks HTTP through the Tor SOCKS proxy
pub struct TorPageFetcher {
    client: Client,
    config: TorConfig,
}

impl TorPageFetcher {
    pub fn new(config: TorConfig) -> Result<Self, FetchError> {
        let client = create_tor_client(&config)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &TorConfig {
        &self.config
    }
}

#[async_trait]
impl PageFetcher for TorPageFetcher {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<FetchedPage, FetchError> {
        debug!("Navigating: {}", url);

        let response = match tokio::time::timeout(timeout, self.client.get(url).send()).await {
            Err(_) => return Err(FetchError::Timeout(timeout)),
            Ok(result) => result.map_err(|e| FetchError::from_reqwest(e, timeout))?,
        };

        let status = response.status().as_u16();
        let final_url = response.url().to_string();

        let script_timeout = self.config.script_timeout;
        let html = match tokio::time::timeout(script_timeout, response.text()).await {
            Err(_) => return Err(FetchError::Timeout(script_timeout)),
            Ok(result) => result.map_err(|e| FetchError::from_reqwest(e, script_timeout))?,
        };

        debug!("Fetched {} ({} bytes, status {})", final_url, html.len(), status);

        Ok(FetchedPage {
            requested_url: url.to_string(),
            final_url,
            status: Some(status),
            html,
        })
    }

    /// No rasteriser is available; the capture is a script-free
    /// snapshot of the document.
    async fn capture_screenshot(&self, page: &FetchedPage) -> Result<Screenshot, FetchError> {
        if page.html.trim().is_empty() {
            return Err(FetchError::Screenshot(format!("{} has no document", page.final_url)));
        }

        Ok(Screenshot {
            bytes: html::strip_scripts(&page.html).into_bytes(),
            extension: "html",
        })
    }
}
