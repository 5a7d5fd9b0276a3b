use crate::config::types::{Config, CrawlerConfig, PriceConfig, ScannerConfig, UserAgentConfig};
use crate::url::{extract_host, parse_root};
use crate::ConfigError;

/// Upper bound on the worker pool
const MAX_POOL_SIZE: usize = 256;

/// Upper bound on attempts per page
const MAX_FETCH_ATTEMPTS: u32 = 10;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_scanner_config(&config.scanner)?;
    validate_price_config(&config.price)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.pool_size < 1 || config.pool_size > MAX_POOL_SIZE {
        return Err(ConfigError::Validation(format!(
            "pool_size must be between 1 and {}, got {}",
            MAX_POOL_SIZE, config.pool_size
        )));
    }

    if config.max_fetch_retries < 1 || config.max_fetch_retries > MAX_FETCH_ATTEMPTS {
        return Err(ConfigError::Validation(format!(
            "max_fetch_retries must be between 1 and {}, got {}",
            MAX_FETCH_ATTEMPTS, config.max_fetch_retries
        )));
    }

    if config.fetch_timeout_millis < 100 {
        return Err(ConfigError::Validation(format!(
            "fetch_timeout_millis must be >= 100ms, got {}ms",
            config.fetch_timeout_millis
        )));
    }

    let root = parse_root(&config.root_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid root_url '{}': {}", config.root_url, e))
    })?;

    if let Some(host) = &config.host {
        validate_host(host)?;

        let root_host = extract_host(&root).unwrap_or_default();
        if !root_host.eq_ignore_ascii_case(host) {
            return Err(ConfigError::Validation(format!(
                "root_url host '{}' does not match host '{}'",
                root_host, host
            )));
        }
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates link scanning rules
fn validate_scanner_config(config: &ScannerConfig) -> Result<(), ConfigError> {
    for path in &config.deny_paths {
        if !path.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "deny path '{}' must start with '/'",
                path
            )));
        }
    }

    if config.filter_params.iter().any(|p| p.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "filter_params cannot contain empty keys".to_string(),
        ));
    }

    Ok(())
}

/// Validates price range configuration
fn validate_price_config(config: &PriceConfig) -> Result<(), ConfigError> {
    if !config.min.is_finite() || !config.max.is_finite() {
        return Err(ConfigError::Validation(
            "price range bounds must be finite numbers".to_string(),
        ));
    }

    if config.min < 0.0 {
        return Err(ConfigError::Validation(format!(
            "price min must be >= 0, got {}",
            config.min
        )));
    }

    if config.min > config.max {
        return Err(ConfigError::Validation(format!(
            "price min ({}) must not exceed max ({})",
            config.min, config.max
        )));
    }

    Ok(())
}

/// Validates a host name or IPv4 address
fn validate_host(host: &str) -> Result<(), ConfigError> {
    if host.is_empty() {
        return Err(ConfigError::InvalidHost("Host cannot be empty".to_string()));
    }

    if host.eq_ignore_ascii_case("localhost") {
        return Ok(());
    }

    if !host
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidHost(format!(
            "Host '{}' contains invalid characters",
            host
        )));
    }

    if host.starts_with('.') || host.ends_with('.') || host.starts_with('-') || host.ends_with('-')
    {
        return Err(ConfigError::InvalidHost(format!(
            "Host '{}' cannot start or end with '.' or '-'",
            host
        )));
    }

    if host.contains("..") {
        return Err(ConfigError::InvalidHost(format!(
            "Host '{}' cannot contain consecutive dots",
            host
        )));
    }

    if !host.contains('.') {
        return Err(ConfigError::InvalidHost(format!(
            "Host '{}' must contain at least one dot (e.g., 'www.example.com')",
            host
        )));
    }

    Ok(())
}
