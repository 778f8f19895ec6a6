use crate::state::PageRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Request counters shared by every render context of a crawl
///
/// Both counters only ever grow. `total` counts every request a render
/// context issued or would have issued; `blocked` counts the subset the
/// interceptor aborted.
#[derive(Debug, Default)]
pub struct RequestCounters {
    total: AtomicU64,
    blocked: AtomicU64,
}

impl RequestCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_allowed(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_blocked(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.blocked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn blocked(&self) -> u64 {
        self.blocked.load(Ordering::Relaxed)
    }
}

/// Statistics of one crawl, finalized when the crawl completes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlStats {
    /// The normalized start URL, used as the origin reference downstream
    pub base_url: String,

    pub start_time: DateTime<Utc>,

    /// Unset until the crawl completes
    pub end_time: Option<DateTime<Utc>>,

    /// Requests issued by render contexts, blocked ones included
    pub total_requests: u64,

    /// Requests aborted by the resource interceptor
    pub blocked_requests: u64,

    /// Distinct URLs visited
    pub visited_pages: usize,

    /// Visited plus still-pending URLs at the end of the crawl
    pub found_urls: usize,

    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

impl CrawlStats {
    /// Starts the clock for a crawl of `base_url`
    pub fn start(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            start_time: Utc::now(),
            end_time: None,
            total_requests: 0,
            blocked_requests: 0,
            visited_pages: 0,
            found_urls: 0,
            duration_ms: 0,
        }
    }

    /// Records the end time and copies the final counter values
    pub fn finalize(&mut self, counters: &RequestCounters, visited: usize, pending: usize) {
        let end = Utc::now();
        self.end_time = Some(end);
        self.duration_ms = (end - self.start_time).num_milliseconds().max(0) as u64;
        self.total_requests = counters.total();
        self.blocked_requests = counters.blocked();
        self.visited_pages = visited;
        self.found_urls = visited + pending;
    }

    /// Throughput over the whole crawl
    pub fn pages_per_second(&self) -> f64 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        self.visited_pages as f64 / (self.duration_ms as f64 / 1000.0)
    }
}

/// Everything a crawl hands to the analysis stage
#[derive(Debug, Clone, Serialize)]
pub struct CrawlResult {
    /// True if the crawl ended because `stop()` was requested
    pub stopped: bool,

    /// One record per visited URL, in completion order of batches
    pub results: Vec<PageRecord>,

    pub stats: CrawlStats,
}
