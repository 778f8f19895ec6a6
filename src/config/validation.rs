use crate::config::types::{CrawlerConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Largest fetch pool a configuration may request
pub const MAX_POOL_SIZE: usize = 16;

/// Validates the entire configuration
pub fn validate(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_pool(config)?;
    validate_timeouts(config)?;
    validate_user_agent_config(&config.user_agent)?;
    Ok(())
}

/// Validates fetch pool sizing
fn validate_pool(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.pool_size < 1 || config.pool_size > MAX_POOL_SIZE {
        return Err(ConfigError::Validation(format!(
            "pool_size must be between 1 and {}, got {}",
            MAX_POOL_SIZE, config.pool_size
        )));
    }

    if config.max_sitemap_depth > 10 {
        return Err(ConfigError::Validation(format!(
            "max_sitemap_depth must be <= 10, got {}",
            config.max_sitemap_depth
        )));
    }

    Ok(())
}

/// Validates timeouts; a zero timeout would fail every request
fn validate_timeouts(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let timeouts = [
        ("navigation_timeout_ms", config.navigation_timeout_ms),
        ("sitemap_probe_timeout_ms", config.sitemap_probe_timeout_ms),
        ("sitemap_fetch_timeout_ms", config.sitemap_fetch_timeout_ms),
    ];

    for (name, value) in timeouts {
        if value == 0 {
            return Err(ConfigError::Validation(format!(
                "{} must be greater than 0",
                name
            )));
        }
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.name.is_empty() {
        return Err(ConfigError::Validation(
            "user agent name cannot be empty".to_string(),
        ));
    }

    if !config
        .name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "user agent name must contain only alphanumeric characters, hyphens and underscores, got '{}'",
            config.name
        )));
    }

    Url::parse(&config.contact_url).map_err(|e| {
        ConfigError::Validation(format!(
            "invalid contact_url '{}': {}",
            config.contact_url, e
        ))
    })?;

    Ok(())
}
