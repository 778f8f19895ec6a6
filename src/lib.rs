//! Site-Crawl: the data-acquisition stage of a site audit
//!
//! This crate crawls a bounded set of pages under one origin, extracts the
//! links each page carries, and streams throttled progress to a consumer.
//! Pages are fetched through a fixed pool of render contexts, and an optional
//! sitemap pass can seed the frontier alongside hyperlink traversal.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use std::time::Duration;
use thiserror::Error;

/// Lower bound for the page cap of a crawl
pub const MIN_PAGES: usize = 10;

/// Upper bound for the page cap of a crawl
pub const MAX_PAGES: usize = 10_000;

/// Errors that abort a crawl before it starts
///
/// Everything that can go wrong once pages are being fetched is recorded as
/// data in the crawl result instead.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("max pages must be between {MIN_PAGES} and {MAX_PAGES}, got {value}")]
    InvalidPageCap { value: usize },

    #[error("invalid start URL '{url}': {reason}")]
    InvalidStartUrl { url: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Failure of a single page navigation
///
/// These never abort a batch; the fetch pool turns them into a page record
/// carrying the error text.
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("navigation to {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },

    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("failed to read body of {url}: {message}")]
    Body { url: String, message: String },
}

/// Failure while reading one node of a sitemap tree
#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("failed to fetch sitemap {url}: {source}")]
    Fetch { url: String, source: reqwest::Error },

    #[error("sitemap {url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("malformed sitemap XML in {url}: {message}")]
    Xml { url: String, message: String },
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{CrawlerConfig, SitemapSeeding};
pub use crawler::{crawl, CrawlProgress, Crawler, StopHandle};
pub use state::{CrawlResult, CrawlStats, PageRecord};
pub use url::{normalize_url, UrlScope};
