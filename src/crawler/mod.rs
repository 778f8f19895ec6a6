//! Crawler module for page fetching and crawl orchestration
//!
//! This module contains the crawl engine, including:
//! - The URL frontier and its page cap
//! - The fetch pool of render contexts and request interception
//! - Link and subresource extraction from fetched documents
//! - Sitemap discovery
//! - Throttled progress reporting
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod progress;
mod scheduler;
mod sitemap;

pub use coordinator::{validate_target, CrawlTarget, Crawler, StopHandle};
pub use fetcher::{
    build_http_client, HttpRenderContext, HttpRenderHost, InterceptDecision, Navigation,
    RenderContext, RenderHost, RequestInterceptor,
};
pub use frontier::Frontier;
pub use parser::{parse_document, ParsedDocument, ResourceKind, Subresource};
pub use progress::{CrawlProgress, ProgressReporter};
pub use scheduler::{FetchPool, SlotGuard};
pub use sitemap::{parse_sitemap, SitemapDocument, SitemapResolver, SITEMAP_PATHS};

use crate::config::CrawlerConfig;
use crate::state::CrawlResult;
use crate::CrawlError;

/// Crawls `start_url` with the default configuration
///
/// The page cap and start URL are validated before anything is allocated.
///
/// # Arguments
///
/// * `start_url` - Absolute URL the crawl starts from
/// * `max_pages` - Page cap between 10 and 10000
///
/// # Returns
///
/// * `Ok(CrawlResult)` - Pages visited and crawl statistics
/// * `Err(CrawlError)` - Invalid input or render host failure
///
/// # Example
///
/// ```no_run
/// use site_crawl::crawler::crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let result = crawl("https://example.com/", 50).await?;
/// println!("Visited {} pages", result.results.len());
/// # Ok(())
/// # }
/// ```
pub async fn crawl(start_url: &str, max_pages: usize) -> Result<CrawlResult, CrawlError> {
    validate_target(start_url, max_pages)?;
    Crawler::new(CrawlerConfig::default())?
        .crawl(start_url, max_pages)
        .await
}
