//! Output module for presenting crawl results
//!
//! This module handles:
//! - Printing a statistics summary of a crawl
//! - Exporting the crawl result as JSON for the analysis stage

mod json;
pub mod stats;

pub use json::{to_json, write_json};
pub use stats::{load_statistics, print_statistics, print_summary, CrawlStatistics};
