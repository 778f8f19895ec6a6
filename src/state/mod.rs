//! State module for crawl data
//!
//! # Components
//!
//! - `PageRecord`: the immutable outcome of fetching one URL
//! - `CrawlStats`: timing and request counters, finalized at crawl end
//! - `RequestCounters`: lock-free counters shared by concurrent fetches
//! - `CrawlResult`: the payload returned by a crawl

mod crawl_stats;
mod page_record;

pub use crawl_stats::{CrawlResult, CrawlStats, RequestCounters};
pub use page_record::PageRecord;
