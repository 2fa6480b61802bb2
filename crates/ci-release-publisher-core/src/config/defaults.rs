//! Default configuration values

pub use crate::tags::{DEFAULT_STAGING_PREFIX, DEFAULT_TAG_PREFIX};
pub use ci_release_publisher_providers::github::DEFAULT_API_URL as DEFAULT_GITHUB_API_URL;

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "ci-release-publisher.toml";

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "ci-release-publisher.yaml";

/// Default total number of attempts per idempotent request
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default base backoff between attempts, in milliseconds
pub const DEFAULT_BACKOFF_MS: u64 = 100;

/// Default TCP connect timeout, in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Get list of config file names to search for, in order of preference
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_TOML,
        DEFAULT_CONFIG_YAML,
        ".ci-release-publisher.toml",
        ".ci-release-publisher.yaml",
    ]
}
