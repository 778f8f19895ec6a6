//! Sitemap discovery and expansion
//!
//! This module handles:
//! - Probing the usual sitemap locations of an origin with cheap HEAD requests
//! - Parsing sitemap and sitemap-index documents
//! - Expanding sitemap-index trees with an explicit worklist, bounded in
//!   depth and in the number of URLs collected
//!
//! Any failure at a node of the tree is logged and contributes nothing; the
//! crawl proceeds without a sitemap if none can be read.

use crate::config::CrawlerConfig;
use crate::crawler::progress::CrawlProgress;
use crate::url::{normalize_url, UrlScope};
use crate::SitemapError;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::{Client, StatusCode};
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::broadcast;
use url::Url;

/// Locations probed, in order, relative to the crawl origin
pub const SITEMAP_PATHS: &[&str] = &[
    "/sitemap.xml",
    "/sitemap_index.xml",
    "/sitemap-index.xml",
    "/post-sitemap.xml",
    "/page-sitemap.xml",
    "/category-sitemap.xml",
    "/product-sitemap.xml",
    "/sitemap1.xml",
];

/// A parsed sitemap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// `<sitemapindex>`: locations of child sitemaps
    Index(Vec<String>),
    /// `<urlset>`: page locations, unfiltered
    UrlSet(Vec<String>),
}

/// Parses sitemap XML
///
/// A document with any `<sitemap><loc>` entry is an index; otherwise the
/// `<url><loc>` entries are collected. Namespace prefixes are ignored.
pub fn parse_sitemap(xml: &str, source_url: &str) -> Result<SitemapDocument, SitemapError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut parents: Vec<Vec<u8>> = Vec::new();
    let mut loc_text: Option<String> = None;
    let mut sitemap_locs = Vec::new();
    let mut url_locs = Vec::new();

    let xml_error = |e: quick_xml::Error| SitemapError::Xml {
        url: source_url.to_string(),
        message: e.to_string(),
    };

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                if name == b"loc" {
                    loc_text = Some(String::new());
                }
                parents.push(name);
            }
            Event::End(e) => {
                parents.pop();
                if e.local_name().as_ref() == b"loc" {
                    let text = loc_text.take().unwrap_or_default();
                    let text = text.trim();
                    if text.is_empty() {
                        continue;
                    }
                    match parents.last().map(Vec::as_slice) {
                        Some(b"sitemap") => sitemap_locs.push(text.to_string()),
                        Some(b"url") => url_locs.push(text.to_string()),
                        _ => {}
                    }
                }
            }
            Event::Text(t) => {
                if let Some(buffer) = loc_text.as_mut() {
                    buffer.push_str(&t.unescape().map_err(xml_error)?);
                }
            }
            Event::CData(c) => {
                if let Some(buffer) = loc_text.as_mut() {
                    buffer.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if sitemap_locs.is_empty() {
        Ok(SitemapDocument::UrlSet(url_locs))
    } else {
        Ok(SitemapDocument::Index(sitemap_locs))
    }
}

/// Pending node of the sitemap tree
struct SitemapNode {
    url: String,
    depth: usize,
    /// 1-based position among its siblings, and the sibling count
    position: Option<(usize, usize)>,
}

/// Resolves the sitemap of an origin into candidate page URLs
pub struct SitemapResolver {
    client: Client,
    scope: UrlScope,
    max_depth: usize,
    max_urls: usize,
    probe_timeout: Duration,
    fetch_timeout: Duration,
    progress: Option<(broadcast::Sender<CrawlProgress>, usize)>,
}

impl SitemapResolver {
    /// Creates a resolver for a crawl capped at `max_pages`
    ///
    /// Expansion stops once twice the page cap has been collected.
    pub fn new(client: Client, scope: UrlScope, max_pages: usize, config: &CrawlerConfig) -> Self {
        Self {
            client,
            scope,
            max_depth: config.max_sitemap_depth,
            max_urls: max_pages.saturating_mul(2),
            probe_timeout: config.sitemap_probe_timeout(),
            fetch_timeout: config.sitemap_fetch_timeout(),
            progress: None,
        }
    }

    /// Publishes a sample after each child sitemap of an index
    pub fn with_progress(mut self, sender: broadcast::Sender<CrawlProgress>, total: usize) -> Self {
        self.progress = Some((sender, total));
        self
    }

    /// Finds the origin's sitemap and expands it
    ///
    /// Returns normalized same-origin URLs in sitemap order; empty if no
    /// sitemap exists or none of it could be read.
    pub async fn discover(&self, base_url: &str) -> Vec<String> {
        let Ok(base) = Url::parse(base_url) else {
            tracing::warn!("Cannot look for a sitemap of unparseable URL {}", base_url);
            return Vec::new();
        };

        match self.probe(&base).await {
            Some(sitemap_url) => {
                tracing::info!("Found sitemap: {}", sitemap_url);
                let urls = self.resolve(&sitemap_url).await;
                tracing::info!("Sitemap yielded {} URLs", urls.len());
                urls
            }
            None => {
                tracing::info!("No sitemap found, continuing with link discovery only");
                Vec::new()
            }
        }
    }

    /// Returns the first probed location answering HEAD with 200
    pub async fn probe(&self, base: &Url) -> Option<String> {
        for path in SITEMAP_PATHS {
            let Ok(candidate) = base.join(path) else {
                continue;
            };

            let response = self
                .client
                .head(candidate.as_str())
                .timeout(self.probe_timeout)
                .send()
                .await;

            match response {
                Ok(response) if response.status() == StatusCode::OK => {
                    return Some(candidate.into());
                }
                Ok(response) => {
                    tracing::trace!("No sitemap at {} (HTTP {})", candidate, response.status());
                }
                Err(e) => {
                    tracing::trace!("Sitemap probe {} failed: {}", candidate, e);
                }
            }
        }

        None
    }

    /// Expands a sitemap tree rooted at `sitemap_url`
    pub async fn resolve(&self, sitemap_url: &str) -> Vec<String> {
        let mut urls = Vec::new();
        let mut seen = HashSet::new();
        let mut worklist = vec![SitemapNode {
            url: sitemap_url.to_string(),
            depth: 0,
            position: None,
        }];

        while let Some(node) = worklist.pop() {
            if urls.len() >= self.max_urls {
                tracing::info!(
                    "Collected {} sitemap URLs, skipping the remaining sitemaps",
                    urls.len()
                );
                break;
            }

            if node.depth > self.max_depth {
                tracing::warn!(
                    "Sitemap {} is nested deeper than {} levels, skipping",
                    node.url,
                    self.max_depth
                );
                continue;
            }

            if !seen.insert(node.url.clone()) {
                tracing::debug!("Sitemap {} already read, skipping", node.url);
                continue;
            }

            tracing::debug!("Parsing sitemap {} (level {})", node.url, node.depth);
            match self.fetch_document(&node.url).await {
                Ok(SitemapDocument::Index(children)) => {
                    tracing::debug!(
                        "Sitemap index {} lists {} child sitemaps",
                        node.url,
                        children.len()
                    );
                    let count = children.len();
                    // Reversed so children are read in document order
                    for (i, child) in children.into_iter().enumerate().rev() {
                        worklist.push(SitemapNode {
                            url: child,
                            depth: node.depth + 1,
                            position: Some((i + 1, count)),
                        });
                    }
                }
                Ok(SitemapDocument::UrlSet(locs)) => {
                    let before = urls.len();
                    urls.extend(
                        locs.iter()
                            .filter(|loc| self.scope.is_same_origin(loc))
                            .map(|loc| normalize_url(loc)),
                    );
                    tracing::debug!("Sitemap {} contributed {} URLs", node.url, urls.len() - before);
                }
                Err(e) => {
                    tracing::warn!("Skipping sitemap: {}", e);
                }
            }

            if let Some((position, count)) = node.position {
                self.publish_progress(position, count, urls.len());
            }
        }

        urls
    }

    /// Downloads and parses one sitemap document
    async fn fetch_document(&self, url: &str) -> Result<SitemapDocument, SitemapError> {
        let response = self
            .client
            .get(url)
            .timeout(self.fetch_timeout)
            .send()
            .await
            .map_err(|source| SitemapError::Fetch {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SitemapError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| SitemapError::Fetch {
            url: url.to_string(),
            source,
        })?;

        parse_sitemap(&body, url)
    }

    fn publish_progress(&self, position: usize, count: usize, found: usize) {
        if let Some((sender, total)) = &self.progress {
            let sample = CrawlProgress::new(
                0,
                *total,
                format!("Parsing sitemap ({}/{})...", position, count),
                found,
            )
            .with_percent(0);
            let _ = sender.send(sample);
        }
    }
}
