//! HTML parser for extracting links and subresource requests
//!
//! This module handles parsing a loaded document to extract:
//! - Anchor targets to follow, resolved the way a DOM resolves `a.href`
//! - Subresources a browser would request while loading the document,
//!   classified so the request interceptor can decide which to abort

use scraper::{Html, Selector};
use url::Url;

/// Kind of a request issued while loading a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Document,
    Stylesheet,
    Image,
    Media,
    Font,
    Script,
    Fetch,
    Other,
}

impl ResourceKind {
    /// Heavy resources that carry nothing the crawl needs
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Image | Self::Stylesheet | Self::Font | Self::Media)
    }

    /// Maps a preload destination (`<link rel="preload" as="...">`) to a kind
    pub fn from_destination(destination: &str) -> Self {
        match destination.trim().to_ascii_lowercase().as_str() {
            "style" => Self::Stylesheet,
            "image" => Self::Image,
            "font" => Self::Font,
            "audio" | "video" | "track" => Self::Media,
            "script" | "worker" => Self::Script,
            "fetch" => Self::Fetch,
            "document" | "iframe" => Self::Document,
            _ => Self::Other,
        }
    }
}

/// A request the document would trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subresource {
    pub url: String,
    pub kind: ResourceKind,
}

/// Extracted information from a loaded document
#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    /// Absolute targets of every `<a href>`, in document order
    pub links: Vec<String>,

    /// Subresources referenced by the document, in document order
    pub subresources: Vec<Subresource>,
}

/// Selector table for subresource discovery
const SUBRESOURCE_SELECTORS: &[(&str, &str, ResourceKind)] = &[
    ("img[src]", "src", ResourceKind::Image),
    ("input[type='image'][src]", "src", ResourceKind::Image),
    ("link[rel~='stylesheet'][href]", "href", ResourceKind::Stylesheet),
    ("link[rel~='icon'][href]", "href", ResourceKind::Image),
    ("script[src]", "src", ResourceKind::Script),
    ("video[src]", "src", ResourceKind::Media),
    ("audio[src]", "src", ResourceKind::Media),
    ("source[src]", "src", ResourceKind::Media),
    ("track[src]", "src", ResourceKind::Media),
    ("iframe[src]", "src", ResourceKind::Document),
];

/// Parses a document and extracts links and subresources
///
/// Relative references are resolved against `<base href>` when the document
/// declares one, otherwise against `document_url`.
///
/// # Example
///
/// ```
/// use site_crawl::crawler::parse_document;
/// use url::Url;
///
/// let html = r#"<html><body><a href="/page">Link</a><img src="/a.png"></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_document(html, &base_url);
/// assert_eq!(parsed.links, vec!["https://example.com/page".to_string()]);
/// assert_eq!(parsed.subresources.len(), 1);
/// ```
pub fn parse_document(html: &str, document_url: &Url) -> ParsedDocument {
    let document = Html::parse_document(html);
    let base_url = effective_base_url(&document, document_url);

    ParsedDocument {
        links: extract_links(&document, &base_url),
        subresources: extract_subresources(&document, &base_url),
    }
}

/// Honors the first `<base href>` element, as browsers do
fn effective_base_url(document: &Html, document_url: &Url) -> Url {
    let Ok(selector) = Selector::parse("base[href]") else {
        return document_url.clone();
    };

    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("href"))
        .and_then(|href| document_url.join(href.trim()).ok())
        .unwrap_or_else(|| document_url.clone())
}

/// Extracts all anchor targets from the document
fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Extracts every subresource the document would request
fn extract_subresources(document: &Html, base_url: &Url) -> Vec<Subresource> {
    let mut found = Vec::new();

    for (css, attr, kind) in SUBRESOURCE_SELECTORS {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        for element in document.select(&selector) {
            if let Some(url) = element.value().attr(attr).and_then(|v| resolve_link(v, base_url)) {
                found.push(Subresource { url, kind: *kind });
            }
        }
    }

    if let Ok(preload) = Selector::parse("link[rel~='preload'][as][href]") {
        for element in document.select(&preload) {
            let destination = element.value().attr("as").unwrap_or_default();
            if let Some(url) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, base_url))
            {
                found.push(Subresource {
                    url,
                    kind: ResourceKind::from_destination(destination),
                });
            }
        }
    }

    found
}

/// Resolves a reference to an absolute HTTP(S) URL
///
/// Returns None for empty references, fragment-only anchors, pseudo-schemes
/// such as `javascript:` and `mailto:`, and anything that does not resolve.
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => {
            Some(absolute_url.to_string())
        }
        _ => None,
    }
}
