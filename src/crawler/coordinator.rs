//! Crawl coordinator - main crawl orchestration logic
//!
//! This module contains the batch loop that ties the crawl together:
//! - Validating the crawl request before anything is allocated
//! - Opening the fetch pool and seeding the frontier
//! - Optional sitemap seeding, up front or in the background
//! - Dispatching batches and folding discovered links back into the frontier
//! - Observing stop requests at batch boundaries
//! - Releasing render contexts and finalizing statistics

use crate::config::{validate, CrawlerConfig, SitemapSeeding};
use crate::crawler::fetcher::{build_http_client, HttpRenderHost, RenderHost, RequestInterceptor};
use crate::crawler::frontier::Frontier;
use crate::crawler::progress::{CrawlProgress, ProgressReporter};
use crate::crawler::scheduler::FetchPool;
use crate::crawler::sitemap::SitemapResolver;
use crate::state::{CrawlResult, CrawlStats, PageRecord, RequestCounters};
use crate::url::{normalize_url, UrlScope};
use crate::{CrawlError, MAX_PAGES, MIN_PAGES};
use futures::future::join_all;
use reqwest::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use url::Url;

/// Requests a running crawl to stop
///
/// The request is observed at the next batch boundary; fetches already in
/// flight run to completion. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// A validated crawl request
#[derive(Debug, Clone)]
pub struct CrawlTarget {
    /// The normalized start URL
    pub base_url: String,

    /// Hostname every crawled URL must share
    pub scope: UrlScope,

    pub max_pages: usize,
}

/// Validates the page cap and start URL of a crawl
///
/// # Arguments
///
/// * `start_url` - Absolute URL with a host
/// * `max_pages` - Page cap, between [`MIN_PAGES`] and [`MAX_PAGES`]
///
/// # Returns
///
/// * `Ok(CrawlTarget)` - The normalized start URL and its scope
/// * `Err(CrawlError)` - The cap is out of range or the URL is unusable
pub fn validate_target(start_url: &str, max_pages: usize) -> Result<CrawlTarget, CrawlError> {
    if !(MIN_PAGES..=MAX_PAGES).contains(&max_pages) {
        return Err(CrawlError::InvalidPageCap { value: max_pages });
    }

    let parsed = Url::parse(start_url).map_err(|e| CrawlError::InvalidStartUrl {
        url: start_url.to_string(),
        reason: e.to_string(),
    })?;

    let scope = UrlScope::from_url(&parsed).ok_or_else(|| CrawlError::InvalidStartUrl {
        url: start_url.to_string(),
        reason: "URL has no host".to_string(),
    })?;

    Ok(CrawlTarget {
        base_url: normalize_url(parsed.as_str()),
        scope,
        max_pages,
    })
}

/// Main crawler structure
///
/// A crawler runs exactly one crawl: [`Crawler::crawl`] consumes it.
/// Subscribe to progress and take a stop handle before starting.
pub struct Crawler {
    config: CrawlerConfig,
    host: Arc<dyn RenderHost>,
    client: Client,
    reporter: ProgressReporter,
    stop: StopHandle,
}

impl Crawler {
    /// Creates a crawler backed by the HTTP render host
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to crawl
    /// * `Err(CrawlError)` - Invalid configuration or HTTP client failure
    pub fn new(config: CrawlerConfig) -> Result<Self, CrawlError> {
        validate(&config)?;
        let client = build_http_client(&config.user_agent)?;
        let host = Arc::new(HttpRenderHost::with_client(client.clone()));
        Ok(Self::assemble(config, host, client))
    }

    /// Creates a crawler that renders pages on `host`
    pub fn with_render_host(
        config: CrawlerConfig,
        host: Arc<dyn RenderHost>,
    ) -> Result<Self, CrawlError> {
        validate(&config)?;
        let client = build_http_client(&config.user_agent)?;
        Ok(Self::assemble(config, host, client))
    }

    fn assemble(config: CrawlerConfig, host: Arc<dyn RenderHost>, client: Client) -> Self {
        let reporter = ProgressReporter::new(config.progress_throttle());
        Self {
            config,
            host,
            client,
            reporter,
            stop: StopHandle::new(),
        }
    }

    /// Subscribes to progress samples of the upcoming crawl
    pub fn subscribe(&self) -> broadcast::Receiver<CrawlProgress> {
        self.reporter.subscribe()
    }

    /// Handle for stopping the crawl from another task
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Runs the crawl to completion, exhaustion, or stop
    ///
    /// Only an invalid page cap or start URL, or a render host that cannot
    /// open its contexts, is returned as an error. Everything that goes
    /// wrong per page or per sitemap is recorded and the crawl carries on.
    pub async fn crawl(self, start_url: &str, max_pages: usize) -> Result<CrawlResult, CrawlError> {
        let target = validate_target(start_url, max_pages)?;
        let CrawlTarget {
            base_url,
            scope,
            max_pages,
        } = target;

        tracing::info!(
            "Starting crawl of {} (max {} pages, {} render contexts)",
            base_url,
            max_pages,
            self.config.pool_size
        );

        let mut stats = CrawlStats::start(&base_url);
        let counters = Arc::new(RequestCounters::new());

        self.announce("Launching render host...", max_pages, 0);
        let pool = match FetchPool::open(
            self.host.as_ref(),
            self.config.pool_size,
            RequestInterceptor::new(counters.clone()),
            scope.clone(),
            self.config.navigation_timeout(),
        )
        .await
        {
            Ok(pool) => pool,
            Err(e) => {
                tracing::error!("Failed to open render contexts: {}", e);
                self.host.close().await;
                return Err(e);
            }
        };

        self.announce("Preparing crawl...", max_pages, 0);
        let mut frontier = Frontier::new(max_pages);
        frontier.seed(&base_url);

        let mut background = None;
        match self.config.sitemap {
            SitemapSeeding::Disabled => {}
            SitemapSeeding::Prefetch => {
                let resolver = self
                    .sitemap_resolver(scope.clone(), max_pages)
                    .with_progress(self.reporter.sender(), max_pages);
                let candidates = resolver.discover(&base_url).await;
                offer_candidates(&mut frontier, candidates);
            }
            SitemapSeeding::Background => {
                let resolver = self.sitemap_resolver(scope.clone(), max_pages);
                let base = base_url.clone();
                background = Some(tokio::spawn(async move { resolver.discover(&base).await }));
            }
        }

        self.announce("Ready, starting crawl...", max_pages, frontier.pending_count());
        if !self.config.startup_delay().is_zero() {
            tokio::time::sleep(self.config.startup_delay()).await;
        }

        let batch_delay = self.config.batch_delay(max_pages);
        let mut results: Vec<PageRecord> = Vec::new();

        loop {
            if background.as_ref().is_some_and(JoinHandle::is_finished) {
                if let Some(handle) = background.take() {
                    merge_background(&mut frontier, handle).await;
                }
            }

            if self.stop.is_stopped() {
                tracing::info!("Stop requested, ending crawl after {} pages", results.len());
                break;
            }

            if !frontier.has_pending() {
                match background.take() {
                    Some(handle) => {
                        tracing::debug!("Frontier drained, waiting for sitemap discovery");
                        merge_background(&mut frontier, handle).await;
                        continue;
                    }
                    None => break,
                }
            }

            let remaining = max_pages.saturating_sub(frontier.visited_count());
            if remaining == 0 {
                tracing::debug!("Page cap of {} reached", max_pages);
                break;
            }

            let size = pool.size().min(frontier.pending_count()).min(remaining);
            let batch = frontier.take_batch(size);
            if batch.is_empty() {
                continue;
            }

            let records = self.run_batch(&pool, &batch, &frontier, max_pages).await;

            let mut admitted = 0;
            for record in records {
                for link in record.links() {
                    if frontier.offer(link) {
                        admitted += 1;
                    }
                }
                results.push(record);
            }
            tracing::debug!(
                "Batch done: {} visited, {} pending, {} new URLs admitted",
                frontier.visited_count(),
                frontier.pending_count(),
                admitted
            );

            // Counts taken after this batch's links were admitted
            let current_url = self
                .reporter
                .last_sample()
                .map(|sample| sample.current_url)
                .unwrap_or_else(|| base_url.clone());
            self.reporter.report(
                CrawlProgress::new(
                    frontier.visited_count(),
                    max_pages,
                    current_url,
                    frontier.pending_count(),
                ),
                true,
            );

            if frontier.has_pending() && !batch_delay.is_zero() {
                tokio::time::sleep(batch_delay).await;
            }
        }

        if let Some(handle) = background.take() {
            handle.abort();
        }

        pool.close().await;
        self.host.close().await;

        let visited = frontier.visited_count();
        stats.finalize(&counters, visited, frontier.pending_count());

        tracing::info!(
            "Crawl completed: {} pages in {:.2}s ({:.2} pages/sec), {} of {} requests blocked",
            visited,
            stats.duration_ms as f64 / 1000.0,
            stats.pages_per_second(),
            stats.blocked_requests,
            stats.total_requests
        );

        self.reporter
            .report(CrawlProgress::new(visited, visited, "Done", 0).with_percent(100), true);

        Ok(CrawlResult {
            stopped: self.stop.is_stopped(),
            results,
            stats,
        })
    }

    /// Fetches every URL of a batch concurrently and waits for all of them
    async fn run_batch(
        &self,
        pool: &FetchPool,
        batch: &[String],
        frontier: &Frontier,
        max_pages: usize,
    ) -> Vec<PageRecord> {
        tracing::debug!("Dispatching batch of {} URLs", batch.len());

        let visited = frontier.visited_count();
        let found = frontier.pending_count();
        let reporter = &self.reporter;

        join_all(batch.iter().map(|url| async move {
            let record = pool.fetch(url).await;
            reporter.report(CrawlProgress::new(visited, max_pages, url.as_str(), found), false);
            record
        }))
        .await
    }

    fn sitemap_resolver(&self, scope: UrlScope, max_pages: usize) -> SitemapResolver {
        SitemapResolver::new(self.client.clone(), scope, max_pages, &self.config)
    }

    fn announce(&self, message: &str, max_pages: usize, found: usize) {
        self.reporter
            .report(CrawlProgress::new(0, max_pages, message, found), true);
    }
}

fn offer_candidates(frontier: &mut Frontier, candidates: Vec<String>) {
    let offered = candidates.len();
    let admitted = candidates
        .iter()
        .filter(|candidate| frontier.offer(candidate))
        .count();
    tracing::info!(
        "Sitemap seeding admitted {} of {} candidate URLs",
        admitted,
        offered
    );
}

async fn merge_background(frontier: &mut Frontier, handle: JoinHandle<Vec<String>>) {
    match handle.await {
        Ok(candidates) => offer_candidates(frontier, candidates),
        Err(e) => tracing::warn!("Background sitemap discovery failed: {}", e),
    }
}
