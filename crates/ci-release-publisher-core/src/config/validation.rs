//! Configuration validation

use ci_release_publisher_providers::TravisEndpoint;
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::tags::validate_prefixes;

use super::types::PublisherConfig;

/// Validate configuration
pub fn validate_config(config: &PublisherConfig) -> Result<()> {
    debug!("validating configuration");
    validate_tags(config)?;
    validate_endpoints(config)?;
    validate_http(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn validate_tags(config: &PublisherConfig) -> Result<()> {
    validate_prefixes(&config.tag_prefix, &config.tag_prefix_tmp)
}

fn validate_url(field: &str, value: &str) -> Result<()> {
    match url::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        Ok(url) => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            message: format!("unsupported URL scheme: {}", url.scheme()),
        }
        .into()),
        Err(e) => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            message: format!("invalid URL {:?}: {}", value, e),
        }
        .into()),
    }
}

fn validate_endpoints(config: &PublisherConfig) -> Result<()> {
    validate_url("github_api_url", &config.github_api_url)?;

    if let TravisEndpoint::Enterprise(url) = &config.travis {
        validate_url("travis.enterprise", url)?;
    }

    Ok(())
}

fn validate_http(config: &PublisherConfig) -> Result<()> {
    if config.http.max_attempts == 0 {
        return Err(ConfigError::InvalidValue {
            field: "http.max_attempts".to_string(),
            message: "must be at least 1".to_string(),
        }
        .into());
    }

    Ok(())
}
