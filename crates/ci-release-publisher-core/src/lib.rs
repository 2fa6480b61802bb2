//! ci-release-publisher core - release lifecycle for CI builds
//!
//! This crate provides the tag naming scheme, configuration, build identity,
//! the draft staging protocol shared by every release kind, the release kind
//! policies themselves, and cleanup of releases left behind by failed or
//! superseded builds.

pub mod artifacts;
pub mod build_ref;
pub mod cleanup;
pub mod config;
pub mod context;
pub mod error;
pub mod releases;
pub mod staging;
pub mod tags;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use artifacts::ArtifactDir;
pub use build_ref::BuildRef;
pub use cleanup::{cleanup_all, cleanup_store, CleanupOptions, CleanupReport};
pub use config::{PublisherConfig, DEFAULT_GITHUB_API_URL};
pub use context::ReleaseContext;
pub use error::{ConfigError, PublisherError, Result};
pub use releases::{publish_all, NumberedOptions, PolicyOutcome, PublishRequest};
pub use staging::{OnExisting, Recheck, StagingOutcome, StagingPlan};
pub use tags::{ReleaseIdentity, TagCodec, TagIdentity};
pub use types::{CleanupRelease, CleanupScope, ReleaseKind, ReleaseOptions, RetentionPolicy};
