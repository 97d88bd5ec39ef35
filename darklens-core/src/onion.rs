//! Onion URL helpers
//!
//! Hidden-service checks and the base domain key used by the domain
//! failure breaker.

use regex::Regex;
use std::sync::LazyLock;

/// File extensions that are never fetched (installable packages)
pub const DEFAULT_DISALLOWED_EXTENSIONS: &[&str] = &[".apk", ".exe", ".msi", ".dmg", ".deb", ".rpm"];

static ONION_LABEL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([a-z2-7]{16,56}\.onion)").unwrap()
});

static ONION_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(https?://)?[a-z2-7]{16,56}\.onion\b[^\s'"<>]*"#).unwrap()
});

/// Strip the scheme, if any
fn strip_scheme(url: &str) -> &str {
    match url.find("://") {
        Some(idx) => &url[idx + 3..],
        None => url,
    }
}

/// Authority part of a URL: everything before the first `/`, `?` or `#`
fn authority(url: &str) -> &str {
    let rest = strip_scheme(url.trim());
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    &rest[..end]
}

/// Host of a URL, without userinfo or port, lower-cased
pub fn host_of(url: &str) -> String {
    let authority = authority(url);
    let host = authority.rsplit('@').next().unwrap_or(authority);
    let host = match host.rfind(':') {
        Some(idx) if host[idx + 1..].chars().all(|c| c.is_ascii_digit()) => &host[..idx],
        _ => host,
    };
    host.trim_end_matches('.').to_lowercase()
}

/// Path part of a URL, without query or fragment
fn path_of(url: &str) -> &str {
    let rest = strip_scheme(url.trim());
    let start = match rest.find('/') {
        Some(idx) => idx,
        None => return "",
    };
    let path = &rest[start..];
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

/// Whether the URL points at a hidden service
pub fn is_hidden_service(url: &str) -> bool {
    let host = host_of(url);
    host.len() > ".onion".len() && host.ends_with(".onion")
}

/// Whether the URL path ends with one of the given extensions
pub fn has_disallowed_extension(url: &str, extensions: &[String]) -> bool {
    let path = path_of(url).to_lowercase();
    extensions
        .iter()
        .any(|ext| !ext.is_empty() && path.ends_with(&ext.to_lowercase()))
}

/// Base domain key for the failure breaker
///
/// The canonical `<16-56 base32 chars>.onion` label when one is present in
/// the host, otherwise the whole lower-cased host.
pub fn base_domain(url: &str) -> String {
    let authority = authority(url);
    if let Some(m) = ONION_LABEL_REGEX.find(authority) {
        return m.as_str().to_lowercase();
    }
    host_of(url)
}

/// Onion addresses mentioned anywhere in raw text, in order of first
/// appearance, with or without a scheme
pub fn find_onion_urls(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for m in ONION_URL_REGEX.find_iter(text) {
        let url = m.as_str();
        if !found.iter().any(|f| f == url) {
            found.push(url.to_string());
        }
    }
    found
}
