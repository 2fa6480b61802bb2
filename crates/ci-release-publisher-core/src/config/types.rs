//! Configuration types

use std::time::Duration;

use ci_release_publisher_providers::{RetryPolicy, TravisEndpoint};
use serde::{Deserialize, Serialize};

use super::defaults::*;

/// Main configuration for ci-release-publisher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// Prefix of every managed tag
    pub tag_prefix: String,

    /// Marker prepended to tags of releases that are not committed yet
    pub tag_prefix_tmp: String,

    /// GitHub API root, e.g. for GitHub Enterprise
    pub github_api_url: String,

    /// Travis-CI installation
    pub travis: TravisEndpoint,

    /// HTTP transport settings
    pub http: HttpConfig,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            tag_prefix: DEFAULT_TAG_PREFIX.to_string(),
            tag_prefix_tmp: DEFAULT_STAGING_PREFIX.to_string(),
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            travis: TravisEndpoint::default(),
            http: HttpConfig::default(),
        }
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Total attempts for idempotent requests
    pub max_attempts: u32,

    /// Base backoff between attempts in milliseconds
    pub backoff_ms: u64,

    /// TCP connect timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_ms: DEFAULT_BACKOFF_MS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl HttpConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.backoff_ms))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PublisherConfig::default();
        assert_eq!(config.tag_prefix, "ci");
        assert_eq!(config.tag_prefix_tmp, "_");
        assert_eq!(config.github_api_url, "https://api.github.com");
        assert_eq!(config.travis, TravisEndpoint::Public);
        assert_eq!(config.http.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: PublisherConfig =
            serde_yaml::from_str("tag_prefix: build\nhttp:\n  max_attempts: 2\n").unwrap();
        assert_eq!(config.tag_prefix, "build");
        assert_eq!(config.tag_prefix_tmp, "_");
        assert_eq!(config.http.max_attempts, 2);
        assert_eq!(config.http.backoff_ms, 100);
    }

    #[test]
    fn test_enterprise_travis_in_toml() {
        let config: PublisherConfig =
            toml::from_str("[travis]\nenterprise = \"https://travis.corp\"\n").unwrap();
        assert_eq!(
            config.travis,
            TravisEndpoint::Enterprise("https://travis.corp".to_string())
        );
    }
}
