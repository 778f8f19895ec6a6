use crate::config::types::CrawlerConfig;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// Every key is optional; missing keys take their defaults.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use site_crawl::config::load_config;
///
/// let config = load_config(Path::new("crawl.toml")).unwrap();
/// println!("Pool size: {}", config.pool_size);
/// ```
pub fn load_config(path: &Path) -> Result<CrawlerConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<CrawlerConfig, ConfigError> {
    let config: CrawlerConfig = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}
