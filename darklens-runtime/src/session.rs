//! Crawl session
//!
//! One traversal over a list of seeds. Each seed is walked depth-first
//! from an explicit work stack with its own `visited` set; the domain
//! breaker spans every seed of the session.
//!
//! Per URL: gate, fetch, validate, extract, score, merge, recurse.
//! Error pages and pages whose text reports a connection error count
//! as connection failures of their domain.
//! Nothing that happens to a single URL ends the session.

use chrono::{DateTime, Utc};
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use darklens_core::{
    has_disallowed_extension, is_hidden_service, merge, Observation, RiskClassifier, TagExtractor,
    Vocabulary,
};
use darklens_store::{BlobStore, LinkStore};
use darklens_tor::{
    canonical_url, check_page, has_connection_marker, FetchError, FetchedPage, PageFetcher,
};

use crate::{CooldownGuard, CrawlSummary, CrawlerConfig, DomainBreaker, SkipReason, UrlOutcome, UrlVisit};

/// Source of the current time
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Collaborators shared by every session of a crawler
#[derive(Clone)]
pub struct CrawlContext {
    pub store: Arc<dyn LinkStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub classifier: Arc<RiskClassifier>,
    pub tagger: Arc<TagExtractor>,
    pub config: CrawlerConfig,
    clock: Clock,
}

impl CrawlContext {
    pub fn new(
        store: Arc<dyn LinkStore>,
        blobs: Arc<dyn BlobStore>,
        vocabulary: &Vocabulary,
        config: CrawlerConfig,
    ) -> Self {
        Self {
            store,
            blobs,
            classifier: Arc::new(RiskClassifier::new(&vocabulary.risk)),
            tagger: Arc::new(TagExtractor::new(&vocabulary.tags)),
            config,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

/// A pending URL on the work stack
#[derive(Debug, Clone)]
struct CrawlTask {
    url: String,
    /// The seed itself at depth 0, otherwise the referring page
    source_url: String,
    depth: usize,
}

impl CrawlTask {
    fn seed(url: &str) -> Self {
        let url = canonical_url(url);
        Self {
            source_url: url.clone(),
            url,
            depth: 0,
        }
    }
}

/// State of one crawl traversal
pub struct CrawlSession {
    context: CrawlContext,
    fetcher: Arc<dyn PageFetcher>,
    breaker: DomainBreaker,
    cooldown: CooldownGuard,
    visited: HashSet<String>,
    summary: CrawlSummary,
}

impl CrawlSession {
    pub fn new(context: CrawlContext, fetcher: Arc<dyn PageFetcher>) -> Self {
        let cooldown = CooldownGuard::new(context.store.clone(), context.config.cooldown);
        Self {
            context,
            fetcher,
            breaker: DomainBreaker::new(),
            cooldown,
            visited: HashSet::new(),
            summary: CrawlSummary::default(),
        }
    }

    /// Use a breaker shared with other sessions
    pub fn with_breaker(mut self, breaker: DomainBreaker) -> Self {
        self.breaker = breaker;
        self
    }

    pub fn breaker(&self) -> &DomainBreaker {
        &self.breaker
    }

    pub fn summary(&self) -> &CrawlSummary {
        &self.summary
    }

    /// Crawl every seed in order and report
    pub async fn run(&mut self, seeds: &[String]) -> CrawlSummary {
        info!("Crawling {} seeds", seeds.len());

        for seed in seeds {
            self.crawl_seed(seed).await;
        }

        self.summary.failed_domains = self.breaker.failed_domains();
        self.summary.log();
        self.summary.clone()
    }

    /// Walk one seed depth-first
    pub async fn crawl_seed(&mut self, seed: &str) -> Vec<UrlVisit> {
        self.summary.seeds += 1;
        self.visited.clear();

        let max_depth = self.context.config.max_depth;
        let mut stack = vec![CrawlTask::seed(seed)];
        let mut visits = Vec::new();

        while let Some(task) = stack.pop() {
            let (outcome, links) = self.process(&task).await;
            self.summary.record(&outcome);

            if task.depth < max_depth {
                // Reversed so the first discovered link is popped first
                for link in links.into_iter().rev() {
                    if !self.visited.contains(&link) {
                        stack.push(CrawlTask {
                            url: link,
                            source_url: task.url.clone(),
                            depth: task.depth + 1,
                        });
                    }
                }
            }

            visits.push(UrlVisit {
                url: task.url,
                depth: task.depth,
                outcome,
            });
        }

        visits
    }

    /// Run one URL through the pipeline; links are returned only for
    /// pages that were fetched and extracted
    async fn process(&mut self, task: &CrawlTask) -> (UrlOutcome, Vec<String>) {
        if let Some(reason) = self.gate(task).await {
            debug!("Skipping {} ({})", task.url, reason);
            return (UrlOutcome::Skipped(reason), Vec::new());
        }
        self.visited.insert(task.url.clone());

        info!("Crawling {} (depth {})", task.url, task.depth);

        let page = match self.navigate(&task.url).await {
            Ok(page) => page,
            Err(outcome) => return (outcome, Vec::new()),
        };

        if let Err(e) = check_page(&page) {
            warn!("Connection failure on {}: {}", task.url, e);
            self.breaker.mark_failed(&task.url);
            return (UrlOutcome::ConnectionFailure(e.to_string()), Vec::new());
        }

        let content = self.fetcher.extract_visible_text(&page);
        if content.trim().is_empty() {
            let connection_marker = has_connection_marker(&page.html);
            if connection_marker {
                warn!("Connection failure on {}: empty page with connection error", task.url);
                self.breaker.mark_failed(&task.url);
            } else {
                warn!("No visible content on {}", task.url);
            }
            return (UrlOutcome::ContentEmpty { connection_marker }, Vec::new());
        }

        if has_connection_marker(&content) {
            warn!("Connection failure on {}: page reports a connection error", task.url);
            self.breaker.mark_failed(&task.url);
            return (
                UrlOutcome::ConnectionFailure("connection error text on page".to_string()),
                Vec::new(),
            );
        }

        let title = self.fetcher.extract_title(&page);
        let links = self.fetcher.extract_links(&page);
        let screenshot_ref = self.capture(&page).await;

        let assessment = self.context.classifier.classify_detailed(&title, &content);
        if !assessment.high.is_empty() || !assessment.medium.is_empty() {
            debug!(
                "Risk {} for {} (high: {:?}, medium: {:?}, safe: {:?})",
                assessment.score, task.url, assessment.high, assessment.medium, assessment.safe
            );
        }
        let tags = self.context.tagger.extract_tags(&content);

        let observation = Observation {
            url: task.url.clone(),
            source_url: task.source_url.clone(),
            title,
            content,
            risk_score: assessment.score,
            tags,
            screenshot_ref,
            now: self.context.now(),
        };

        (self.persist(&observation, links.len()).await, links)
    }

    async fn gate(&self, task: &CrawlTask) -> Option<SkipReason> {
        let config = &self.context.config;

        if !is_hidden_service(&task.url) {
            return Some(SkipReason::NotHiddenService);
        }
        if has_disallowed_extension(&task.url, &config.disallowed_extensions) {
            return Some(SkipReason::DisallowedExtension);
        }
        if self.visited.contains(&task.url) {
            return Some(SkipReason::Visited);
        }
        if task.depth > config.max_depth {
            return Some(SkipReason::TooDeep);
        }
        if self.breaker.is_failed(&task.url) {
            return Some(SkipReason::FailedDomain);
        }
        if self.cooldown.should_skip(&task.url, self.context.now()).await {
            return Some(SkipReason::CoolingDown);
        }
        None
    }

    /// Navigate, retrying once past a blocking dialog
    async fn navigate(&self, url: &str) -> Result<FetchedPage, UrlOutcome> {
        let timeout = self.context.config.navigation_timeout;

        let mut attempt = self.fetcher.navigate(url, timeout).await;
        if matches!(attempt, Err(FetchError::Dialog(_))) {
            debug!("Dialog blocked {}, retrying", url);
            attempt = self.fetcher.navigate(url, timeout).await;
        }

        match attempt {
            Ok(page) => Ok(page),
            Err(e) if e.is_connection_failure() => {
                warn!("Connection failure on {}: {}", url, e);
                self.breaker.mark_failed(url);
                Err(UrlOutcome::ConnectionFailure(e.to_string()))
            }
            Err(FetchError::Dialog(message)) => {
                warn!("Dialog on {} could not be dismissed: {}", url, message);
                Err(UrlOutcome::DialogArtifact(message))
            }
            Err(e) => {
                error!("Unexpected failure on {}: {}", url, e);
                Err(UrlOutcome::UnexpectedFailure(e.to_string()))
            }
        }
    }

    /// Capture and store the page; failure only loses the screenshot
    async fn capture(&mut self, page: &FetchedPage) -> Option<String> {
        let screenshot = match self.fetcher.capture_screenshot(page).await {
            Ok(screenshot) => screenshot,
            Err(e) => {
                warn!("Screenshot failed for {}: {}", page.requested_url, e);
                self.summary.screenshot_failures += 1;
                return None;
            }
        };

        let name = screenshot_name(self.context.now(), screenshot.extension);
        let reference = self.context.blobs.store(&screenshot.bytes, &name).await;
        if reference.is_none() {
            warn!("Screenshot for {} was not stored", page.requested_url);
            self.summary.screenshot_failures += 1;
        }
        reference
    }

    async fn persist(&self, observation: &Observation, links: usize) -> UrlOutcome {
        let store = &self.context.store;

        let existing = match store.find_by_url(&observation.url).await {
            Ok(existing) => existing,
            Err(e) => {
                error!("Failed to read record for {}: {}", observation.url, e);
                return UrlOutcome::StoreFailure(e.to_string());
            }
        };

        let record = merge(existing.as_ref(), observation);

        match store.upsert(&record).await {
            Ok(_) => {
                info!(
                    "Saved {} [risk {}] ({} sources, {} tags, {} links)",
                    record.url,
                    record.risk_score,
                    record.source_count,
                    record.tags.len(),
                    links
                );
                UrlOutcome::Persisted { links }
            }
            Err(e) => {
                error!("Failed to save {}: {}", record.url, e);
                UrlOutcome::StoreFailure(e.to_string())
            }
        }
    }
}

fn screenshot_name(now: DateTime<Utc>, extension: &str) -> String {
    let suffix: u32 = rand::thread_rng().gen();
    format!("screenshot_{}_{:08x}.{}", now.timestamp_millis(), suffix, extension)
}
