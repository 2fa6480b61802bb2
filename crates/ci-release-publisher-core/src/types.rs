//! Core types for ci-release-publisher

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Kind of release being managed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseKind {
    /// Per-job draft used to pass artifacts between jobs of one build
    Temporary,
    /// Rolling release per branch
    Latest,
    /// One release per build, with retention
    Numbered,
    /// Release for a pushed tag
    Tag,
}

impl ReleaseKind {
    /// Returns the string representation of the release kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Temporary => "temporary",
            Self::Latest => "latest",
            Self::Numbered => "numbered",
            Self::Tag => "tag",
        }
    }
}

impl std::fmt::Display for ReleaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which builds a cleanup pass may touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CleanupScope {
    /// The release stored by this very job
    CurrentJob,
    /// Releases stored by any job of this build
    CurrentBuild,
    /// Releases stored by earlier builds that have finished
    PreviousFinishedBuilds,
}

impl CleanupScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CurrentJob => "current-job",
            Self::CurrentBuild => "current-build",
            Self::PreviousFinishedBuilds => "previous-finished-builds",
        }
    }
}

impl std::fmt::Display for CleanupScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CleanupScope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "current-job" => Ok(Self::CurrentJob),
            "current-build" => Ok(Self::CurrentBuild),
            "previous-finished-builds" => Ok(Self::PreviousFinishedBuilds),
            _ => Err(format!(
                "Unknown cleanup scope: {} (expected current-job, current-build or previous-finished-builds)",
                s
            )),
        }
    }
}

/// Which state of stored releases a cleanup pass may touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanupRelease {
    /// Committed releases, under their final tag
    Complete,
    /// Releases still under their staging tag
    Incomplete,
}

impl CleanupRelease {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Incomplete => "incomplete",
        }
    }
}

impl std::fmt::Display for CleanupRelease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CleanupRelease {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "complete" => Ok(Self::Complete),
            "incomplete" => Ok(Self::Incomplete),
            _ => Err(format!(
                "Unknown cleanup release filter: {} (expected complete or incomplete)",
                s
            )),
        }
    }
}

/// Retention thresholds for numbered releases. Zero disables a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// How many numbered releases to keep, the new one included
    pub keep_count: u64,
    /// Maximum age of a numbered release in seconds
    pub keep_age_seconds: u64,
}

impl RetentionPolicy {
    /// Create a retention policy, refusing one with both thresholds disabled
    pub fn new(keep_count: u64, keep_age_seconds: u64) -> Result<Self> {
        if keep_count == 0 && keep_age_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "numbered-release-keep-count/numbered-release-keep-time".to_string(),
                message: "at least one of keep count or keep time must be greater than zero"
                    .to_string(),
            }
            .into());
        }

        Ok(Self {
            keep_count,
            keep_age_seconds,
        })
    }
}

/// User-facing options shared by every release kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseOptions {
    /// Title override; a generated one is used otherwise
    pub name: Option<String>,
    /// Body override; a generated one is used otherwise
    pub body: Option<String>,
    /// Keep the committed release as a draft
    pub draft: bool,
    /// Mark the committed release as a prerelease
    pub prerelease: bool,
    /// Commit override for the release target
    pub target_commitish: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_scope_parsing() {
        assert_eq!(
            "current-job".parse::<CleanupScope>().unwrap(),
            CleanupScope::CurrentJob
        );
        assert_eq!(
            "previous_finished_builds".parse::<CleanupScope>().unwrap(),
            CleanupScope::PreviousFinishedBuilds
        );
        assert!("next-build".parse::<CleanupScope>().is_err());
    }

    #[test]
    fn test_cleanup_release_parsing() {
        assert_eq!(
            "Incomplete".parse::<CleanupRelease>().unwrap(),
            CleanupRelease::Incomplete
        );
        assert!("partial".parse::<CleanupRelease>().is_err());
    }

    #[test]
    fn test_retention_requires_a_threshold() {
        assert!(RetentionPolicy::new(0, 0).is_err());
        assert!(RetentionPolicy::new(3, 0).is_ok());
        assert!(RetentionPolicy::new(0, 3600).is_ok());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ReleaseKind::Numbered.to_string(), "numbered");
    }
}
