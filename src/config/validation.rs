use crate::config::types::{Config, CrawlConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_output(config)?;
    validate_render(config)?;
    validate_monitor(config)?;
    Ok(())
}

/// Validates the per-run crawl parameters
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    let seed = Url::parse(&config.seed_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed-url '{}': {}", config.seed_url, e)))?;

    if seed.scheme() != "http" && seed.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "seed-url must be HTTP or HTTPS, got scheme '{}'",
            seed.scheme()
        )));
    }

    if seed.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(
            "seed-url has no host component".to_string(),
        ));
    }

    if config.concurrency < 1 || config.concurrency > 64 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 64, got {}",
            config.concurrency
        )));
    }

    if config.rate_limit_rps <= 0.0 || config.rate_limit_rps > 100.0 {
        return Err(ConfigError::Validation(format!(
            "rate-limit-rps must be in (0, 100], got {}",
            config.rate_limit_rps
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(
            "max-pages must be >= 1".to_string(),
        ));
    }

    if config.max_runtime_seconds < 1 {
        return Err(ConfigError::Validation(
            "max-runtime-seconds must be >= 1".to_string(),
        ));
    }

    if config.fetch_timeout_seconds < 1 {
        return Err(ConfigError::Validation(
            "fetch-timeout-seconds must be >= 1".to_string(),
        ));
    }

    if config.follow_external_links && config.external_depth > config.internal_depth {
        return Err(ConfigError::Validation(format!(
            "external-depth ({}) cannot exceed internal-depth ({})",
            config.external_depth, config.internal_depth
        )));
    }

    Ok(())
}

fn validate_output(config: &Config) -> Result<(), ConfigError> {
    if config.output.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_render(config: &Config) -> Result<(), ConfigError> {
    if let Some(endpoint) = &config.render.endpoint {
        Url::parse(endpoint)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid render endpoint: {}", e)))?;
    }
    Ok(())
}

fn validate_monitor(config: &Config) -> Result<(), ConfigError> {
    if config.monitor.running_timeout_minutes < 1 || config.monitor.queued_timeout_minutes < 1 {
        return Err(ConfigError::Validation(
            "monitor timeouts must be >= 1 minute".to_string(),
        ));
    }
    Ok(())
}
