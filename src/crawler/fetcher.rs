//! Render host and render context implementation
//!
//! A render context loads one page at a time and reports the document it
//! ended up with. While a navigation is in flight, every request the page
//! issues passes through a [`RequestInterceptor`], which aborts heavy
//! resources (images, stylesheets, fonts, media) and lets the rest through.
//!
//! The HTTP-backed host shipped here loads documents with `reqwest` and has
//! no script engine: it presents the document request and every subresource
//! the markup references to the interceptor, so request accounting matches
//! what a browser would issue, but it never downloads subresources.

use crate::config::UserAgentConfig;
use crate::crawler::parser::{parse_document, ResourceKind};
use crate::state::RequestCounters;
use crate::{CrawlError, NavigationError};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// What a render context saw after loading a page
#[derive(Debug, Clone)]
pub struct Navigation {
    /// HTTP status of the main document
    pub status: u16,

    /// Document URL after redirects
    pub final_url: String,

    /// Document markup
    pub html: String,

    /// Absolute anchor targets in document order, as `a.href` reports them
    pub anchors: Vec<String>,
}

/// Decision for one intercepted request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptDecision {
    Continue,
    Abort,
}

/// Resource-economy policy applied to every request a page issues
#[derive(Debug, Clone)]
pub struct RequestInterceptor {
    counters: Arc<RequestCounters>,
}

impl RequestInterceptor {
    pub fn new(counters: Arc<RequestCounters>) -> Self {
        Self { counters }
    }

    /// Classifies one request, counting it as allowed or blocked
    pub fn intercept(&self, url: &str, kind: ResourceKind) -> InterceptDecision {
        if kind.is_blocked() {
            self.counters.record_blocked();
            tracing::trace!("Blocked {:?} request: {}", kind, url);
            InterceptDecision::Abort
        } else {
            self.counters.record_allowed();
            tracing::trace!("Allowed {:?} request: {}", kind, url);
            InterceptDecision::Continue
        }
    }

    pub fn counters(&self) -> &Arc<RequestCounters> {
        &self.counters
    }
}

/// An isolated unit that loads one page at a time
///
/// The fetch pool guarantees that at most one navigation runs on a context
/// at any moment.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Loads `url`, waiting until the main document is parsed
    async fn navigate(
        &self,
        url: &str,
        interceptor: &RequestInterceptor,
    ) -> Result<Navigation, NavigationError>;

    /// Releases the context; failures are logged, never returned
    async fn close(&self);
}

/// Owner of the render contexts of one crawl
#[async_trait]
pub trait RenderHost: Send + Sync {
    /// Opens the render context for pool slot `id`
    async fn open_context(&self, id: usize) -> Result<Box<dyn RenderContext>, CrawlError>;

    /// Shuts the host down; failures are logged, never returned
    async fn close(&self);
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use site_crawl::config::UserAgentConfig;
/// use site_crawl::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Render host backed by a plain HTTP client
pub struct HttpRenderHost {
    client: Client,
}

impl HttpRenderHost {
    pub fn new(config: &UserAgentConfig) -> Result<Self, CrawlError> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RenderHost for HttpRenderHost {
    async fn open_context(&self, id: usize) -> Result<Box<dyn RenderContext>, CrawlError> {
        Ok(Box::new(HttpRenderContext {
            id,
            client: self.client.clone(),
        }))
    }

    async fn close(&self) {
        tracing::debug!("HTTP render host closed");
    }
}

/// Render context that loads documents without executing scripts
pub struct HttpRenderContext {
    id: usize,
    client: Client,
}

#[async_trait]
impl RenderContext for HttpRenderContext {
    async fn navigate(
        &self,
        url: &str,
        interceptor: &RequestInterceptor,
    ) -> Result<Navigation, NavigationError> {
        interceptor.intercept(url, ResourceKind::Document);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| NavigationError::Request {
                url: url.to_string(),
                message: classify_request_error(&e),
            })?;

        let status = response.status().as_u16();
        let final_url: Url = response.url().clone();

        let html = response.text().await.map_err(|e| NavigationError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let parsed = parse_document(&html, &final_url);
        for subresource in &parsed.subresources {
            interceptor.intercept(&subresource.url, subresource.kind);
        }

        tracing::trace!(
            "Context {} loaded {} (HTTP {}, {} anchors)",
            self.id,
            final_url,
            status,
            parsed.links.len()
        );

        Ok(Navigation {
            status,
            final_url: final_url.into(),
            html,
            anchors: parsed.links,
        })
    }

    async fn close(&self) {
        tracing::debug!("Render context {} closed", self.id);
    }
}

/// Describes a transport failure in a few words
fn classify_request_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timeout: {}", error)
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else if error.is_redirect() {
        format!("redirect error: {}", error)
    } else {
        error.to_string()
    }
}
