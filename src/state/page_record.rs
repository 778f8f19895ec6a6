use chrono::{DateTime, Utc};
use serde::Serialize;

/// The outcome of fetching one crawled URL
///
/// A record is created exactly once per visited URL and is never modified
/// afterwards; the crawl result owns it. Failed navigations still produce a
/// record, with `status_code == 0`, empty HTML, no links and the error text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    url: String,
    status_code: u16,
    html: String,
    links: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    timestamp: DateTime<Utc>,
}

impl PageRecord {
    /// Record for a navigation that produced a document
    pub fn fetched(url: String, status_code: u16, html: String, links: Vec<String>) -> Self {
        Self {
            url,
            status_code,
            html,
            links,
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Record for a navigation that failed before producing a document
    pub fn failed(url: String, error: impl Into<String>) -> Self {
        Self {
            url,
            status_code: 0,
            html: String::new(),
            links: Vec::new(),
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }

    /// The normalized URL that was requested
    pub fn url(&self) -> &str {
        &self.url
    }

    /// HTTP status of the document, 0 if the navigation failed
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Rendered HTML, empty on failure
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Normalized same-origin links found on the page
    pub fn links(&self) -> &[String] {
        &self.links
    }

    /// Navigation error text, if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// When the record was created
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// True if the navigation produced a document
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
