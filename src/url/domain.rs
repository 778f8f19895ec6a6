use url::Url;

/// Extracts the lowercase hostname from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_crawl::url::extract_hostname;
///
/// let url = Url::parse("https://EXAMPLE.COM:8080/path").unwrap();
/// assert_eq!(extract_hostname(&url), Some("example.com".to_string()));
/// ```
pub fn extract_hostname(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// The origin a crawl is confined to
///
/// Membership compares hostnames only: scheme and port do not matter, so
/// `http://a.com:8080/x` belongs to a crawl of `https://a.com/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlScope {
    hostname: String,
}

impl UrlScope {
    /// Creates a scope for the given hostname
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into().to_lowercase(),
        }
    }

    /// Derives the scope from an absolute URL, if it has a host
    pub fn from_url(url: &Url) -> Option<Self> {
        extract_hostname(url).map(Self::new)
    }

    /// The crawl hostname
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Returns true if `candidate` parses and shares the crawl hostname
    ///
    /// Unparseable candidates are never in scope.
    pub fn is_same_origin(&self, candidate: &str) -> bool {
        Url::parse(candidate)
            .ok()
            .as_ref()
            .and_then(extract_hostname)
            .is_some_and(|host| host == self.hostname)
    }
}
