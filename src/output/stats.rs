//! Statistics summary of a finished crawl
//!
//! This module condenses a crawl result into counts a person can read at a
//! glance and prints them to stdout.

use crate::state::CrawlResult;
use std::collections::BTreeMap;

/// Condensed view of a crawl result
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlStatistics {
    /// Pages with a record in the result
    pub total_pages: usize,

    /// Pages by HTTP status class ("2xx", "3xx", ...), failed fetches excluded
    pub pages_by_status: BTreeMap<String, usize>,

    /// Pages whose navigation failed outright
    pub failed_pages: usize,

    /// Same-origin links found across all pages, duplicates included
    pub total_links: usize,

    /// Failure messages and how often they occurred
    pub error_summary: BTreeMap<String, usize>,

    pub duration_ms: u64,
    pub pages_per_second: f64,
    pub total_requests: u64,
    pub blocked_requests: u64,
    pub stopped: bool,
}

/// Builds statistics from a crawl result
///
/// # Arguments
///
/// * `result` - The result returned by a crawl
///
/// # Returns
///
/// The condensed statistics
pub fn load_statistics(result: &CrawlResult) -> CrawlStatistics {
    let mut pages_by_status = BTreeMap::new();
    let mut error_summary = BTreeMap::new();
    let mut failed_pages = 0;
    let mut total_links = 0;

    for page in &result.results {
        total_links += page.links().len();

        match page.error() {
            Some(error) => {
                failed_pages += 1;
                *error_summary.entry(error_kind(error)).or_insert(0) += 1;
            }
            None => {
                let class = format!("{}xx", page.status_code() / 100);
                *pages_by_status.entry(class).or_insert(0) += 1;
            }
        }
    }

    CrawlStatistics {
        total_pages: result.results.len(),
        pages_by_status,
        failed_pages,
        total_links,
        error_summary,
        duration_ms: result.stats.duration_ms,
        pages_per_second: result.stats.pages_per_second(),
        total_requests: result.stats.total_requests,
        blocked_requests: result.stats.blocked_requests,
        stopped: result.stopped,
    }
}

/// Groups failure messages by their leading clause
fn error_kind(error: &str) -> String {
    if error.contains("timed out") {
        "navigation timeout".to_string()
    } else if error.contains("connection failed") {
        "connection failed".to_string()
    } else if error.starts_with("failed to read body") {
        "unreadable body".to_string()
    } else {
        "request failed".to_string()
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Pages crawled: {}", stats.total_pages);
    println!("  Links found: {}", stats.total_links);
    println!(
        "  Duration: {:.2}s ({:.2} pages/sec)",
        stats.duration_ms as f64 / 1000.0,
        stats.pages_per_second
    );
    println!(
        "  Requests: {} total, {} blocked",
        stats.total_requests, stats.blocked_requests
    );
    if stats.stopped {
        println!("  Stopped before completion");
    }
    println!();

    if !stats.pages_by_status.is_empty() {
        println!("Pages by Status:");
        for (class, count) in &stats.pages_by_status {
            let percentage = if stats.total_pages > 0 {
                (*count as f64 / stats.total_pages as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", class, count, percentage);
        }
        println!();
    }

    if !stats.error_summary.is_empty() {
        println!("Error Summary:");
        let mut error_counts: Vec<_> = stats.error_summary.iter().collect();
        error_counts.sort_by(|a, b| b.1.cmp(a.1));

        for (kind, count) in error_counts {
            println!("  {}: {}", kind, count);
        }
        println!();
    }

    let succeeded = stats.total_pages - stats.failed_pages;
    let success_rate = if stats.total_pages > 0 {
        (succeeded as f64 / stats.total_pages as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} pages loaded)",
        success_rate, succeeded, stats.total_pages
    );
}

/// Prints the statistics of a crawl result
pub fn print_summary(result: &CrawlResult) {
    print_statistics(&load_statistics(result));
}
