//! Error page detection
//!
//! Hidden services that cannot be reached often still produce a
//! document: a blank page or a browser network-error page. These are
//! connection failures, not content.

use crate::{FetchError, FetchedPage};

/// Final URLs that mean navigation never reached the site
pub const ERROR_URL_MARKERS: &[&str] = &["about:neterror", "about:blank"];

/// Raw document markers of a network error page, matched case-insensitively
pub const ERROR_PAGE_MARKERS: &[&str] = &[
    "about:neterror",
    "dnsnotfound",
    "can't connect to the server",
    "can&#39;t connect to the server",
];

/// Visible text markers of a connection problem
pub const CONNECTION_TEXT_MARKERS: &[&str] = &["can't connect", "dns error"];

/// True when the page is a network error page or blank page
pub fn is_error_page(page: &FetchedPage) -> bool {
    let final_url = page.final_url.to_ascii_lowercase();
    if ERROR_URL_MARKERS.iter().any(|m| final_url.starts_with(m)) {
        return true;
    }

    let html = page.html.to_lowercase();
    ERROR_PAGE_MARKERS.iter().any(|m| html.contains(m))
}

/// Reject error pages as a connection failure
pub fn check_page(page: &FetchedPage) -> Result<(), FetchError> {
    if is_error_page(page) {
        return Err(FetchError::ErrorPage(page.final_url.clone()));
    }
    Ok(())
}

/// True when text mentions a connection problem
pub fn has_connection_marker(text: &str) -> bool {
    // Typographic apostrophes show up in rendered error text
    let text = text.to_lowercase().replace('\u{2019}', "'");
    CONNECTION_TEXT_MARKERS.iter().any(|m| text.contains(m))
        || ERROR_PAGE_MARKERS.iter().any(|m| text.contains(m))
}
