//! Configuration module
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration of a crawl. Every key has a default, so a crawl can run
//! with `CrawlerConfig::default()` alone.
//!
//! # Example
//!
//! ```no_run
//! use site_crawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Crawler will use {} render contexts", config.pool_size);
//! ```

mod parser;
mod types;
mod validation;

pub use parser::{load_config, parse_config};
pub use types::{CrawlerConfig, SitemapSeeding, UserAgentConfig, DEFAULT_POOL_SIZE};
pub use validation::{validate, MAX_POOL_SIZE};
