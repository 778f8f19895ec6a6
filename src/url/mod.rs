//! URL handling module
//!
//! This module provides URL normalization and the same-origin filter that
//! confines a crawl to one hostname.

mod domain;
mod normalize;

pub use domain::{extract_hostname, UrlScope};
pub use normalize::normalize_url;
