//! Provider capability traits

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::*;

/// Release and asset operations against a source-control hosting provider
///
/// None of these operations are atomic with respect to each other. Callers
/// are expected to rely on provider-side tag uniqueness and re-validation
/// rather than on any locking.
#[async_trait::async_trait]
pub trait HostingClient: Send + Sync {
    /// List every release of a repository, drafts included
    async fn list_releases(&self, repo: &str) -> Result<Vec<Release>>;

    /// Create a release
    async fn create_release(&self, repo: &str, release: &NewRelease) -> Result<Release>;

    /// Update title, body, flags and optionally the tag of a release in one call
    async fn update_release(&self, release: &Release, update: &ReleaseUpdate) -> Result<Release>;

    /// Delete a release object. The underlying git tag, if any, is kept.
    async fn delete_release(&self, release: &Release) -> Result<()>;

    /// Delete the `refs/tags/<tag>` reference
    async fn delete_tag_ref(&self, repo: &str, tag: &str) -> Result<()>;

    /// Upload a local file as a release asset
    async fn upload_asset(&self, release: &Release, path: &Path) -> Result<Asset>;

    /// List the assets of a release
    async fn list_assets(&self, release: &Release) -> Result<Vec<Asset>>;

    /// Download an asset into a directory, returning the written file path
    async fn download_asset(&self, asset: &Asset, dest_dir: &Path) -> Result<PathBuf>;
}

/// Build status queries against a CI provider
#[async_trait::async_trait]
pub trait CiStatusClient: Send + Sync {
    /// Number of the most recent build of a branch (or pushed tag)
    async fn last_build_number(&self, repo_slug: &str, branch: &str) -> Result<u64>;

    /// Numbers of all builds of a branch that have not finished yet
    async fn unfinished_build_numbers(&self, repo_slug: &str, branch: &str)
        -> Result<BTreeSet<u64>>;

    /// Whether any job of a build failed without being allowed to fail
    async fn build_has_non_allowed_failing_job(&self, build_id: &str) -> Result<bool>;
}
