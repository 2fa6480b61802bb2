//! Error types for ci-release-publisher

use std::path::PathBuf;

use ci_release_publisher_providers::ProviderError;
use thiserror::Error;

/// Result type alias using PublisherError
pub type Result<T> = std::result::Result<T, PublisherError>;

/// Main error type for release operations
#[derive(Debug, Error)]
pub enum PublisherError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The final tag is already taken; restarted jobs are not supported
    #[error("Release with tag name \"{tag}\" already exists. Was this job restarted? Restarts are not supported.")]
    DuplicateRelease { tag: String },

    /// Hosting or CI provider errors
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is not set
    #[error("Environment variable {0} is not set")]
    MissingEnvVar(String),

    /// Environment variable has an unusable value
    #[error("Environment variable {name} has invalid value {value:?}: {reason}")]
    InvalidEnvVar {
        name: String,
        value: String,
        reason: String,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// Artifact directory does not exist
    #[error("Directory \"{0}\" doesn't exist")]
    ArtifactDirMissing(PathBuf),

    /// Artifact directory has nothing in it
    #[error("No artifacts were found in \"{0}\" directory")]
    ArtifactDirEmpty(PathBuf),

    /// `publish` was called without any release kind
    #[error("You must specify what kind of release you would like to publish")]
    NoReleaseKind,

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

impl PublisherError {
    /// Whether this error was raised before any network call was made
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
