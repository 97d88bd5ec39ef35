//! HTML extraction
//!
//! Pulls the title, visible text and hidden-service links out of a
//! fetched document.

use darklens_core::is_hidden_service;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static H1_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());
static BODY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());
static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static SCRIPT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("script").unwrap());

/// Elements whose text never reaches the reader
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Page title, falling back to the first `<h1>`; empty when neither exists
pub fn extract_title(html: &str) -> String {
    let document = Html::parse_document(html);

    let from = |selector: &Selector| {
        document
            .select(selector)
            .map(|el| normalize_whitespace(&el.text().collect::<String>()))
            .find(|text| !text.is_empty())
    };

    from(&TITLE_SELECTOR)
        .or_else(|| from(&H1_SELECTOR))
        .unwrap_or_default()
}

/// Visible body text with whitespace collapsed
pub fn extract_visible_text(html: &str) -> String {
    let document = Html::parse_document(html);

    match document.select(&BODY_SELECTOR).next() {
        Some(body) => visible_text(body),
        None => String::new(),
    }
}

fn visible_text(root: ElementRef<'_>) -> String {
    let mut text_parts = Vec::new();

    for node_ref in root.descendants() {
        if let Node::Text(text_node) = node_ref.value() {
            let hidden = node_ref.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .map(|el| HIDDEN_ELEMENTS.contains(&el.name()))
                    .unwrap_or(false)
            });

            if !hidden {
                let trimmed = text_node.trim();
                if !trimmed.is_empty() {
                    text_parts.push(trimmed);
                }
            }
        }
    }

    normalize_whitespace(&text_parts.join(" "))
}

/// Every hidden-service hyperlink on the page
///
/// Links are resolved against `base_url`, fragments are dropped, and
/// duplicates removed keeping first-seen order.
pub fn extract_links(html: &str, base_url: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let base = Url::parse(base_url).ok();

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&LINK_SELECTOR) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            continue;
        }

        let resolved = match &base {
            Some(base) => base.join(href),
            None => Url::parse(href),
        };
        let Ok(mut url) = resolved else {
            continue;
        };
        if !matches!(url.scheme(), "http" | "https") {
            continue;
        }
        url.set_fragment(None);

        let link = url.to_string();
        if is_hidden_service(&link) && seen.insert(link.clone()) {
            links.push(link);
        }
    }

    links
}

/// Canonical form of an absolute URL: lower-cased host, explicit root
/// path, no fragment. Unparseable input is returned trimmed.
pub fn canonical_url(url: &str) -> String {
    match Url::parse(url.trim()) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url.trim().to_string(),
    }
}

/// Document with `<script>` elements removed, re-serialized from the parse tree
pub fn strip_scripts(html: &str) -> String {
    let mut document = Html::parse_document(html);

    let scripts: Vec<_> = document.select(&SCRIPT_SELECTOR).map(|el| el.id()).collect();
    for id in scripts {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    document.html()
}

/// Schemes that are never web pages even when embedded in an onion link
const NON_WEB_SCHEMES: &[&str] = &["irc://", "ircs://", "xmpp://", "gopher://"];

/// Normalize a harvested onion link to `scheme://host/path`
///
/// Bare addresses get `http://`. Query and fragment are dropped. Links
/// on ports other than 80/443 or pointing at chat protocols are
/// rejected.
pub fn normalize_harvested_link(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let lower = raw.to_ascii_lowercase();
    if NON_WEB_SCHEMES.iter().any(|scheme| lower.contains(scheme)) {
        return None;
    }

    let candidate = if lower.starts_with("http://") || lower.starts_with("https://") {
        raw.to_string()
    } else {
        format!("http://{}", raw)
    };

    let url = Url::parse(&candidate).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    // `port()` is None for the scheme default
    if matches!(url.port(), Some(port) if port != 80 && port != 443) {
        return None;
    }

    let host = url.host_str()?;
    let link = format!("{}://{}{}", url.scheme(), host, url.path());
    is_hidden_service(&link).then_some(link)
}

/// Normalize whitespace in text
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
