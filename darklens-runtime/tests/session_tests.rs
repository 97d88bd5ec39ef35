// Tests for crawl sessions against a scripted fetcher

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use darklens_core::{LinkRecord, RiskScore, Vocabulary};
use darklens_runtime::{
    CrawlContext, CrawlSession, CrawlerConfig, DomainBreaker, SkipReason, UrlOutcome,
};
use darklens_store::{
    BlobStore, FrontierOrder, LinkStore, MemoryBlobStore, MemoryLinkStore, SourceEntry,
    StoreError, UpsertOutcome,
};
use darklens_tor::{FetchError, FetchedPage, PageFetcher, Screenshot};

// ============================================================================
// Test doubles
// ============================================================================

#[derive(Debug, Clone)]
enum Response {
    Html(String),
    Redirect(String, String),
    Timeout,
    Dialog,
    DialogOnce(String),
    Broken,
}

#[derive(Default)]
struct ScriptedFetcher {
    responses: HashMap<String, Response>,
    navigations: Mutex<Vec<String>>,
    fail_screenshots: bool,
}

impl ScriptedFetcher {
    fn new() -> Self {
        Self::default()
    }

    fn page(self, url: &str, html: String) -> Self {
        self.respond(url, Response::Html(html))
    }

    fn respond(mut self, url: &str, response: Response) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    fn failing_screenshots(mut self) -> Self {
        self.fail_screenshots = true;
        self
    }

    fn fetch_count(&self, url: &str) -> usize {
        self.navigations.lock().iter().filter(|u| *u == url).count()
    }

    fn navigations(&self) -> Vec<String> {
        self.navigations.lock().clone()
    }
}

fn fetched(url: &str, final_url: &str, html: &str) -> FetchedPage {
    FetchedPage {
        requested_url: url.to_string(),
        final_url: final_url.to_string(),
        status: Some(200),
        html: html.to_string(),
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn navigate(&self, url: &str, timeout: std::time::Duration) -> Result<FetchedPage, FetchError> {
        let attempt = {
            let mut navigations = self.navigations.lock();
            navigations.push(url.to_string());
            navigations.iter().filter(|u| *u == url).count()
        };

        match self.responses.get(url) {
            None => Err(FetchError::Unreachable(url.to_string())),
            Some(Response::Html(html)) => Ok(fetched(url, url, html)),
            Some(Response::Redirect(final_url, html)) => Ok(fetched(url, final_url, html)),
            Some(Response::Timeout) => Err(FetchError::Timeout(timeout)),
            Some(Response::Dialog) => Err(FetchError::Dialog("alert".to_string())),
            Some(Response::DialogOnce(html)) => {
                if attempt == 1 {
                    Err(FetchError::Dialog("age check".to_string()))
                } else {
                    Ok(fetched(url, url, html))
                }
            }
            Some(Response::Broken) => Err(FetchError::Other("renderer crashed".to_string())),
        }
    }

    async fn capture_screenshot(&self, page: &FetchedPage) -> Result<Screenshot, FetchError> {
        if self.fail_screenshots {
            return Err(FetchError::Screenshot("no renderer".to_string()));
        }
        Ok(Screenshot {
            bytes: page.html.as_bytes().to_vec(),
            extension: "png",
        })
    }
}

/// Link store with switchable failures
#[derive(Default)]
struct FlakyStore {
    inner: MemoryLinkStore,
    fail_reads: bool,
    fail_writes: bool,
}

#[async_trait]
impl LinkStore for FlakyStore {
    async fn find_by_url(&self, url: &str) -> Result<Option<LinkRecord>, StoreError> {
        if self.fail_reads {
            return Err(StoreError::Unavailable("read timeout".to_string()));
        }
        self.inner.find_by_url(url).await
    }

    async fn upsert(&self, record: &LinkRecord) -> Result<UpsertOutcome, StoreError> {
        if self.fail_writes {
            return Err(StoreError::Unavailable("disk full".to_string()));
        }
        self.inner.upsert(record).await
    }

    async fn list_active_frontier(&self, order: FrontierOrder) -> Result<Vec<String>, StoreError> {
        self.inner.list_active_frontier(order).await
    }

    async fn add_frontier(&self, url: &str, description: Option<&str>) -> Result<bool, StoreError> {
        self.inner.add_frontier(url, description).await
    }

    async fn set_frontier_active(&self, url: &str, active: bool) -> Result<bool, StoreError> {
        self.inner.set_frontier_active(url, active).await
    }

    async fn top_trending(&self, limit: usize) -> Result<Vec<LinkRecord>, StoreError> {
        self.inner.top_trending(limit).await
    }

    async fn list_active_sources(&self) -> Result<Vec<SourceEntry>, StoreError> {
        self.inner.list_active_sources().await
    }

    async fn add_source(&self, url: &str, description: Option<&str>) -> Result<bool, StoreError> {
        self.inner.add_source(url, description).await
    }

    async fn mark_source_checked(&self, url: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.inner.mark_source_checked(url, at).await
    }
}

/// Blob store that never accepts anything
struct RejectingBlobStore;

#[async_trait]
impl BlobStore for RejectingBlobStore {
    async fn store(&self, _bytes: &[u8], _name: &str) -> Option<String> {
        None
    }
}

// ============================================================================
// Helpers
// ============================================================================

struct Harness {
    store: Arc<MemoryLinkStore>,
    blobs: Arc<MemoryBlobStore>,
    clock: Arc<Mutex<DateTime<Utc>>>,
    config: CrawlerConfig,
}

impl Harness {
    fn new() -> Self {
        Self {
            store: Arc::new(MemoryLinkStore::new()),
            blobs: Arc::new(MemoryBlobStore::new()),
            clock: Arc::new(Mutex::new(start())),
            config: CrawlerConfig::default(),
        }
    }

    fn context(&self) -> CrawlContext {
        let clock = self.clock.clone();
        CrawlContext::new(
            self.store.clone(),
            self.blobs.clone(),
            &Vocabulary::default(),
            self.config.clone(),
        )
        .with_clock(move || *clock.lock())
    }

    fn session(&self, fetcher: &Arc<ScriptedFetcher>) -> CrawlSession {
        CrawlSession::new(self.context(), fetcher.clone())
    }

    fn advance(&self, by: Duration) {
        *self.clock.lock() += by;
    }

    async fn record(&self, url: &str) -> LinkRecord {
        self.store.find_by_url(url).await.unwrap().unwrap()
    }
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn html(title: &str, body: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|link| format!("<a href=\"{}\">{}</a>", link, link))
        .collect();
    format!(
        "<html><head><title>{}</title></head><body><p>{}</p>{}</body></html>",
        title, body, anchors
    )
}

fn seeds(urls: &[&str]) -> Vec<String> {
    urls.iter().map(|u| u.to_string()).collect()
}

// ============================================================================
// Domain breaker
// ============================================================================

#[tokio::test]
async fn test_breaker_skips_rest_of_failed_domain() {
    let harness = Harness::new();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page(
                "http://hub.onion/",
                html(
                    "Hub",
                    "directory of services",
                    &[
                        "http://deadsite.onion/a",
                        "http://deadsite.onion/b",
                        "http://deadsite.onion/c",
                    ],
                ),
            )
            .respond("http://deadsite.onion/a", Response::Timeout)
            .page("http://deadsite.onion/b", html("B", "alive", &[])),
    );

    let mut session = harness.session(&fetcher);
    let summary = session
        .run(&seeds(&["http://hub.onion/", "http://deadsite.onion/"]))
        .await;

    assert_eq!(fetcher.fetch_count("http://deadsite.onion/a"), 1);
    assert_eq!(fetcher.fetch_count("http://deadsite.onion/b"), 0);
    assert_eq!(fetcher.fetch_count("http://deadsite.onion/c"), 0);
    assert_eq!(fetcher.fetch_count("http://deadsite.onion/"), 0);

    assert_eq!(summary.connection_failures, 1);
    assert_eq!(summary.skipped_for(SkipReason::FailedDomain), 3);
    assert_eq!(summary.failed_domains, vec!["deadsite.onion".to_string()]);
}

#[tokio::test]
async fn test_error_page_trips_breaker() {
    let harness = Harness::new();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page(
                "http://hub.onion/",
                html("Hub", "links", &["http://gone.onion/1", "http://gone.onion/2"]),
            )
            .respond(
                "http://gone.onion/1",
                Response::Redirect("about:neterror?e=dnsNotFound".to_string(), String::new()),
            ),
    );

    let mut session = harness.session(&fetcher);
    let visits = session.crawl_seed("http://hub.onion/").await;

    assert!(matches!(visits[1].outcome, UrlOutcome::ConnectionFailure(_)));
    assert_eq!(visits[2].outcome, UrlOutcome::Skipped(SkipReason::FailedDomain));
    assert!(session.breaker().is_failed("http://gone.onion/"));
}

#[tokio::test]
async fn test_shared_breaker_spans_sessions() {
    let harness = Harness::new();
    let fetcher = Arc::new(ScriptedFetcher::new().respond("http://flaky.onion/", Response::Timeout));
    let breaker = DomainBreaker::new();

    let mut first = harness.session(&fetcher).with_breaker(breaker.clone());
    first.crawl_seed("http://flaky.onion/").await;

    let mut second = harness.session(&fetcher).with_breaker(breaker.clone());
    let visits = second.crawl_seed("http://flaky.onion/other").await;

    assert_eq!(visits[0].outcome, UrlOutcome::Skipped(SkipReason::FailedDomain));
    assert_eq!(fetcher.navigations().len(), 1);
}

// ============================================================================
// Cool-down
// ============================================================================

#[tokio::test]
async fn test_cooldown_fetches_once_within_window() {
    let harness = Harness::new();
    let fetcher = Arc::new(
        ScriptedFetcher::new().page("http://sitea.onion/", html("A", "forum home", &[])),
    );

    harness.session(&fetcher).crawl_seed("http://sitea.onion/").await;
    harness.advance(Duration::minutes(90));
    let visits = harness.session(&fetcher).crawl_seed("http://sitea.onion/").await;

    assert_eq!(visits[0].outcome, UrlOutcome::Skipped(SkipReason::CoolingDown));
    assert_eq!(fetcher.fetch_count("http://sitea.onion/"), 1);

    harness.advance(Duration::minutes(31));
    harness.session(&fetcher).crawl_seed("http://sitea.onion/").await;
    assert_eq!(fetcher.fetch_count("http://sitea.onion/"), 2);
}

#[tokio::test]
async fn test_cooldown_applies_across_seeds() {
    let harness = Harness::new();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page("http://seeda.onion/", html("A", "seed a", &["http://shared.onion/"]))
            .page("http://seedb.onion/", html("B", "seed b", &["http://shared.onion/"]))
            .page("http://shared.onion/", html("Shared", "shared page", &[])),
    );

    let mut session = harness.session(&fetcher);
    let summary = session
        .run(&seeds(&["http://seeda.onion/", "http://seedb.onion/"]))
        .await;

    assert_eq!(fetcher.fetch_count("http://shared.onion/"), 1);
    assert_eq!(summary.skipped_for(SkipReason::CoolingDown), 1);
}

#[tokio::test]
async fn test_cooldown_lookup_failure_fails_open() {
    let store = Arc::new(FlakyStore {
        fail_reads: true,
        ..Default::default()
    });
    let fetcher = Arc::new(
        ScriptedFetcher::new().page(
            "http://sitea.onion/",
            html("A", "forum", &["http://sitea.onion/child"]),
        )
        .page("http://sitea.onion/child", html("Child", "thread", &[])),
    );
    let context = CrawlContext::new(
        store,
        Arc::new(MemoryBlobStore::new()),
        &Vocabulary::default(),
        CrawlerConfig::default(),
    );

    let mut session = CrawlSession::new(context, fetcher.clone());
    let visits = session.crawl_seed("http://sitea.onion/").await;

    assert_eq!(fetcher.fetch_count("http://sitea.onion/"), 1);
    // The record cannot be read for merging, but links are still followed
    assert!(matches!(visits[0].outcome, UrlOutcome::StoreFailure(_)));
    assert_eq!(fetcher.fetch_count("http://sitea.onion/child"), 1);
}

// ============================================================================
// Merging and persistence
// ============================================================================

#[tokio::test]
async fn test_source_union_over_sessions() {
    let harness = Harness::new();
    let target = "http://target.onion/";
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page("http://srca.onion/", html("A", "list", &[target]))
            .page("http://srcb.onion/", html("B", "list", &[target]))
            .page("http://srcc.onion/", html("C", "list", &[target]))
            .page(target, html("Target", "escrow market", &[])),
    );

    for seed in ["http://srca.onion/", "http://srcb.onion/", "http://srca.onion/", "http://srcc.onion/"] {
        harness.session(&fetcher).crawl_seed(seed).await;
        harness.advance(Duration::hours(3));
    }

    let record = harness.record(target).await;
    assert_eq!(
        record.source_urls,
        vec!["http://srca.onion/", "http://srcb.onion/", "http://srcc.onion/"]
    );
    assert_eq!(record.source_count, 3);
    assert_eq!(fetcher.fetch_count(target), 4);
}

#[tokio::test]
async fn test_persisted_record_contents() {
    let harness = Harness::new();
    let fetcher = Arc::new(ScriptedFetcher::new().page(
        "http://shop.onion/",
        html("Hacking forum", "stolen credit card dumps for sale, pay with bitcoin", &[]),
    ));

    harness.session(&fetcher).crawl_seed("http://shop.onion/").await;

    let record = harness.record("http://shop.onion/").await;
    assert_eq!(record.title, "Hacking forum");
    assert_eq!(record.risk_score, RiskScore::High);
    assert!(record.tags.contains("bitcoin"));
    assert_eq!(record.source_urls, vec!["http://shop.onion/"]);
    assert_eq!(record.last_crawled_at, start());
    assert!(record.is_active);
    assert!(record.screenshot_ref.unwrap().starts_with("memory://screenshot_"));
    assert_eq!(harness.blobs.len(), 1);
}

#[tokio::test]
async fn test_store_write_failure_still_follows_links() {
    let store = Arc::new(FlakyStore {
        fail_writes: true,
        ..Default::default()
    });
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page("http://sitea.onion/", html("A", "index", &["http://siteb.onion/"]))
            .page("http://siteb.onion/", html("B", "page", &[])),
    );
    let context = CrawlContext::new(
        store.clone(),
        Arc::new(MemoryBlobStore::new()),
        &Vocabulary::default(),
        CrawlerConfig::default(),
    );

    let mut session = CrawlSession::new(context, fetcher.clone());
    let summary = session.run(&seeds(&["http://sitea.onion/"])).await;

    assert_eq!(fetcher.fetch_count("http://siteb.onion/"), 1);
    assert_eq!(summary.store_failures, 2);
    assert_eq!(summary.persisted, 0);
    assert!(store.inner.is_empty());
}

// ============================================================================
// Traversal
// ============================================================================

#[tokio::test]
async fn test_depth_bound() {
    let harness = Harness::new();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page("http://chain.onion/0", html("0", "zero", &["http://chain.onion/1"]))
            .page("http://chain.onion/1", html("1", "one", &["http://chain.onion/2"]))
            .page("http://chain.onion/2", html("2", "two", &["http://chain.onion/3"]))
            .page("http://chain.onion/3", html("3", "three", &["http://chain.onion/4"])),
    );

    let visits = harness.session(&fetcher).crawl_seed("http://chain.onion/0").await;

    let depths: Vec<usize> = visits.iter().map(|v| v.depth).collect();
    assert_eq!(depths, vec![0, 1, 2]);
    assert_eq!(fetcher.fetch_count("http://chain.onion/3"), 0);
    assert_eq!(harness.record("http://chain.onion/2").await.source_urls, vec!["http://chain.onion/1"]);
}

#[tokio::test]
async fn test_depth_first_discovery_order() {
    let harness = Harness::new();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page(
                "http://root.onion/",
                html("Root", "root", &["http://left.onion/", "http://right.onion/"]),
            )
            .page("http://left.onion/", html("Left", "left", &["http://leftchild.onion/"]))
            .page("http://leftchild.onion/", html("Leaf", "leaf", &[]))
            .page("http://right.onion/", html("Right", "right", &[])),
    );

    harness.session(&fetcher).crawl_seed("http://root.onion/").await;

    assert_eq!(
        fetcher.navigations(),
        vec![
            "http://root.onion/",
            "http://left.onion/",
            "http://leftchild.onion/",
            "http://right.onion/",
        ]
    );
}

#[tokio::test]
async fn test_cycle_in_links_is_visited_once() {
    let harness = Harness::new();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page("http://ping.onion/", html("Ping", "ping", &["http://pong.onion/"]))
            .page("http://pong.onion/", html("Pong", "pong", &["http://ping.onion/"])),
    );

    harness.session(&fetcher).crawl_seed("http://ping.onion/").await;

    assert_eq!(fetcher.fetch_count("http://ping.onion/"), 1);
    assert_eq!(fetcher.fetch_count("http://pong.onion/"), 1);
}

#[tokio::test]
async fn test_gate_rejects_clearnet_and_packages() {
    let harness = Harness::new();
    let fetcher = Arc::new(
        ScriptedFetcher::new().page(
            "http://files.onion/",
            html("Files", "downloads", &["http://files.onion/app.apk", "http://files.onion/readme"]),
        )
        .page("http://files.onion/readme", html("Readme", "text", &[])),
    );

    let mut session = harness.session(&fetcher);
    let summary = session
        .run(&seeds(&["https://example.com/", "http://files.onion/"]))
        .await;

    assert_eq!(summary.skipped_for(SkipReason::NotHiddenService), 1);
    assert_eq!(summary.skipped_for(SkipReason::DisallowedExtension), 1);
    assert_eq!(fetcher.fetch_count("http://files.onion/app.apk"), 0);
    assert_eq!(fetcher.fetch_count("http://files.onion/readme"), 1);
}

#[tokio::test]
async fn test_seed_is_canonicalized() {
    let harness = Harness::new();
    let fetcher = Arc::new(
        ScriptedFetcher::new().page("http://sitea.onion/", html("A", "home", &[])),
    );

    harness.session(&fetcher).crawl_seed("http://siteA.onion").await;

    assert_eq!(fetcher.fetch_count("http://sitea.onion/"), 1);
    assert!(harness.store.find_by_url("http://sitea.onion/").await.unwrap().is_some());
}

// ============================================================================
// Failure classes
// ============================================================================

#[tokio::test]
async fn test_empty_content_does_not_trip_breaker() {
    let harness = Harness::new();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page(
                "http://hub.onion/",
                html("Hub", "links", &["http://quiet.onion/1", "http://quiet.onion/2"]),
            )
            .page("http://quiet.onion/1", "<html><body>   </body></html>".to_string())
            .page("http://quiet.onion/2", html("Two", "content", &[])),
    );

    let visits = harness.session(&fetcher).crawl_seed("http://hub.onion/").await;

    assert_eq!(visits[1].outcome, UrlOutcome::ContentEmpty { connection_marker: false });
    assert!(matches!(visits[2].outcome, UrlOutcome::Persisted { .. }));
    assert!(harness.store.find_by_url("http://quiet.onion/1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_empty_content_with_connection_marker_trips_breaker() {
    let harness = Harness::new();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page(
                "http://hub.onion/",
                html("Hub", "links", &["http://proxyerr.onion/1", "http://proxyerr.onion/2"]),
            )
            .page(
                "http://proxyerr.onion/1",
                "<html><head><title>Can't connect</title></head><body></body></html>".to_string(),
            ),
    );

    let visits = harness.session(&fetcher).crawl_seed("http://hub.onion/").await;

    assert_eq!(visits[1].outcome, UrlOutcome::ContentEmpty { connection_marker: true });
    assert_eq!(visits[2].outcome, UrlOutcome::Skipped(SkipReason::FailedDomain));
}

#[tokio::test]
async fn test_connection_error_text_trips_breaker() {
    let harness = Harness::new();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page(
                "http://hub.onion/",
                html("Hub", "links", &["http://proxyerr.onion/a", "http://proxyerr.onion/b"]),
            )
            .page(
                "http://proxyerr.onion/a",
                html(
                    "Problem loading page",
                    "We can&#39;t connect to the server at proxyerr.onion. DNS error.",
                    &["http://proxyerr.onion/c"],
                ),
            )
            .page("http://proxyerr.onion/b", html("B", "alive", &[])),
    );

    let mut session = harness.session(&fetcher);
    let visits = session.crawl_seed("http://hub.onion/").await;

    assert!(matches!(visits[1].outcome, UrlOutcome::ConnectionFailure(_)));
    assert_eq!(visits[2].outcome, UrlOutcome::Skipped(SkipReason::FailedDomain));
    assert!(session.breaker().is_failed("http://proxyerr.onion/"));
    assert_eq!(fetcher.fetch_count("http://proxyerr.onion/b"), 0);
    assert_eq!(fetcher.fetch_count("http://proxyerr.onion/c"), 0);
    assert!(harness.store.find_by_url("http://proxyerr.onion/a").await.unwrap().is_none());
}

#[tokio::test]
async fn test_connection_error_text_without_error_page_markup() {
    let harness = Harness::new();
    let fetcher = Arc::new(ScriptedFetcher::new().page(
        "http://relay.onion/",
        html("Relay", "Upstream said: dns error while resolving host", &[]),
    ));

    let mut session = harness.session(&fetcher);
    let summary = session.run(&seeds(&["http://relay.onion/"])).await;

    assert_eq!(summary.connection_failures, 1);
    assert_eq!(summary.persisted, 0);
    assert_eq!(summary.failed_domains, vec!["relay.onion".to_string()]);
}

#[tokio::test]
async fn test_dialog_is_retried_once() {
    let harness = Harness::new();
    let fetcher = Arc::new(ScriptedFetcher::new().respond(
        "http://gated.onion/",
        Response::DialogOnce(html("Gated", "welcome in", &[])),
    ));

    let visits = harness.session(&fetcher).crawl_seed("http://gated.onion/").await;

    assert!(matches!(visits[0].outcome, UrlOutcome::Persisted { .. }));
    assert_eq!(fetcher.fetch_count("http://gated.onion/"), 2);
}

#[tokio::test]
async fn test_persistent_dialog_does_not_trip_breaker() {
    let harness = Harness::new();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page(
                "http://hub.onion/",
                html("Hub", "links", &["http://popup.onion/1", "http://popup.onion/2"]),
            )
            .respond("http://popup.onion/1", Response::Dialog)
            .page("http://popup.onion/2", html("Two", "content", &[])),
    );

    let visits = harness.session(&fetcher).crawl_seed("http://hub.onion/").await;

    assert!(matches!(visits[1].outcome, UrlOutcome::DialogArtifact(_)));
    assert_eq!(fetcher.fetch_count("http://popup.onion/1"), 2);
    assert!(matches!(visits[2].outcome, UrlOutcome::Persisted { .. }));
}

#[tokio::test]
async fn test_unexpected_failure_is_contained() {
    let harness = Harness::new();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page(
                "http://hub.onion/",
                html("Hub", "links", &["http://crashy.onion/", "http://fine.onion/"]),
            )
            .respond("http://crashy.onion/", Response::Broken)
            .page("http://fine.onion/", html("Fine", "content", &[])),
    );

    let mut session = harness.session(&fetcher);
    let summary = session.run(&seeds(&["http://hub.onion/"])).await;

    assert_eq!(summary.unexpected_failures, 1);
    assert_eq!(summary.persisted, 2);
    assert!(summary.failed_domains.is_empty());
}

// ============================================================================
// Screenshots
// ============================================================================

#[tokio::test]
async fn test_screenshot_failure_still_persists() {
    let harness = Harness::new();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page("http://sitea.onion/", html("A", "content", &[]))
            .failing_screenshots(),
    );

    let mut session = harness.session(&fetcher);
    let summary = session.run(&seeds(&["http://sitea.onion/"])).await;

    let record = harness.record("http://sitea.onion/").await;
    assert_eq!(record.screenshot_ref, None);
    assert_eq!(summary.persisted, 1);
    assert_eq!(summary.screenshot_failures, 1);
    assert!(harness.blobs.is_empty());
}

#[tokio::test]
async fn test_blob_store_failure_still_persists() {
    let store = Arc::new(MemoryLinkStore::new());
    let fetcher = Arc::new(ScriptedFetcher::new().page("http://sitea.onion/", html("A", "content", &[])));
    let context = CrawlContext::new(
        store.clone(),
        Arc::new(RejectingBlobStore),
        &Vocabulary::default(),
        CrawlerConfig::default(),
    );

    let mut session = CrawlSession::new(context, fetcher.clone());
    let summary = session.run(&seeds(&["http://sitea.onion/"])).await;

    let record = store.find_by_url("http://sitea.onion/").await.unwrap().unwrap();
    assert_eq!(record.screenshot_ref, None);
    assert_eq!(summary.screenshot_failures, 1);
}

// ============================================================================
// End to end
// ============================================================================

#[tokio::test]
async fn test_two_sessions_merge_sources_and_raise_trending() {
    let harness = Harness::new();
    let seed_a = "http://sitea.onion/";
    let page2 = "http://sitea.onion/page2";
    let seed_b = "http://siteb.onion/";

    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page(seed_a, html("Site A", "forum index", &["/page2"]))
            .page(page2, html("Page 2", "forum thread", &[]))
            .page(seed_b, html("Site B", "link list", &[seed_a])),
    );

    let mut first = harness.session(&fetcher);
    first.run(&seeds(&["http://siteA.onion"])).await;

    let a_before = harness.record(seed_a).await;
    assert_eq!(a_before.source_urls, vec![seed_a]);
    assert_eq!(harness.record(page2).await.source_urls, vec![seed_a]);

    harness.advance(Duration::hours(3));

    let mut second = harness.session(&fetcher);
    let summary = second.run(&seeds(&[seed_b, seed_a])).await;

    let a_after = harness.record(seed_a).await;
    assert_eq!(a_after.source_urls, vec![seed_a, seed_b]);
    assert_eq!(a_after.source_count, 2);
    assert!(a_after.trending_score > a_before.trending_score);
    assert_eq!(a_after.last_crawled_at, start() + Duration::hours(3));

    assert_eq!(fetcher.fetch_count(seed_a), 2);
    assert_eq!(fetcher.fetch_count(page2), 2);
    assert_eq!(harness.record(page2).await.source_urls, vec![seed_a]);
    assert_eq!(summary.skipped_for(SkipReason::CoolingDown), 1);
}
