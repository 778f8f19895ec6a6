use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of concurrent render contexts
pub const DEFAULT_POOL_SIZE: usize = 3;

/// Main configuration structure for a crawl
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Number of render contexts in the fetch pool
    pub pool_size: usize,

    /// Upper bound for a single page navigation (milliseconds)
    pub navigation_timeout_ms: u64,

    /// Timeout of the existence check for a sitemap path (milliseconds)
    pub sitemap_probe_timeout_ms: u64,

    /// Timeout for downloading one sitemap document (milliseconds)
    pub sitemap_fetch_timeout_ms: u64,

    /// Minimum time between two unforced progress samples (milliseconds)
    pub progress_throttle_ms: u64,

    /// Fixed delay between batches; derived from the page cap when unset
    pub batch_delay_ms: Option<u64>,

    /// Pause after the "ready" progress sample (milliseconds)
    pub startup_delay_ms: u64,

    /// Whether and how sitemap URLs seed the frontier
    pub sitemap: SitemapSeeding,

    /// Deepest sitemap index level that is still expanded
    pub max_sitemap_depth: usize,

    /// Identification sent with every request
    pub user_agent: UserAgentConfig,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            navigation_timeout_ms: 30_000,
            sitemap_probe_timeout_ms: 5_000,
            sitemap_fetch_timeout_ms: 10_000,
            progress_throttle_ms: 200,
            batch_delay_ms: None,
            startup_delay_ms: 100,
            sitemap: SitemapSeeding::Disabled,
            max_sitemap_depth: 3,
            user_agent: UserAgentConfig::default(),
        }
    }
}

impl CrawlerConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn sitemap_probe_timeout(&self) -> Duration {
        Duration::from_millis(self.sitemap_probe_timeout_ms)
    }

    pub fn sitemap_fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.sitemap_fetch_timeout_ms)
    }

    pub fn progress_throttle(&self) -> Duration {
        Duration::from_millis(self.progress_throttle_ms)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    /// Delay applied after every batch
    ///
    /// Larger crawls wait less between batches so that they finish in
    /// reasonable time; an explicit `batch-delay-ms` always wins.
    pub fn batch_delay(&self, max_pages: usize) -> Duration {
        if let Some(ms) = self.batch_delay_ms {
            return Duration::from_millis(ms);
        }

        let ms = if max_pages > 5000 {
            300
        } else if max_pages > 1000 {
            500
        } else {
            1000
        };
        Duration::from_millis(ms)
    }
}

/// How sitemap discovery feeds the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SitemapSeeding {
    /// Hyperlink traversal only
    #[default]
    Disabled,
    /// Resolve the sitemap before the first batch and offer every candidate
    Prefetch,
    /// Resolve the sitemap concurrently and merge it at a batch boundary
    Background,
}

impl std::str::FromStr for SitemapSeeding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "disabled" | "off" => Ok(Self::Disabled),
            "prefetch" => Ok(Self::Prefetch),
            "background" => Ok(Self::Background),
            other => Err(format!(
                "unknown sitemap mode '{}', expected disabled, prefetch or background",
                other
            )),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub name: String,

    /// Version of the crawler
    pub version: String,

    /// URL with information about the crawler
    pub contact_url: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: "SEO-Audit-Tool".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://github.com/username/seo-audit-tool".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!("{}/{} (+{})", self.name, self.version, self.contact_url)
    }
}
