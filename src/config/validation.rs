use crate::config::types::{Config, CrawlerConfig, HttpConfig, OutputConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_http_config(&config.http)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_listing_root(&config.listing_root)?;

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.max_consecutive_duplicates < 1 {
        return Err(ConfigError::Validation(format!(
            "max_consecutive_duplicates must be >= 1, got {}",
            config.max_consecutive_duplicates
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    validate_delay_range(
        "detail delay",
        config.detail_delay_min_ms,
        config.detail_delay_max_ms,
    )?;
    validate_delay_range(
        "page delay",
        config.page_delay_min_ms,
        config.page_delay_max_ms,
    )?;

    Ok(())
}

/// Validates the listing root URL
fn validate_listing_root(listing_root: &str) -> Result<(), ConfigError> {
    let url = Url::parse(listing_root).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid listing root '{}': {}", listing_root, e))
    })?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::Validation(format!(
            "Listing root '{}' must use HTTP or HTTPS",
            listing_root
        )));
    }

    Ok(())
}

fn validate_delay_range(name: &str, min_ms: u64, max_ms: u64) -> Result<(), ConfigError> {
    if min_ms > max_ms {
        return Err(ConfigError::Validation(format!(
            "{} range is inverted: min {}ms > max {}ms",
            name, min_ms, max_ms
        )));
    }
    Ok(())
}

/// Validates the request identity headers
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("user_agent", &config.user_agent),
        ("accept", &config.accept),
        ("accept_language", &config.accept_language),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
