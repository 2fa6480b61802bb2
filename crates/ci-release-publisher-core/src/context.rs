//! Collaborators and build identity shared by every release operation

use ci_release_publisher_providers::{CiStatusClient, HostingClient, Release, TravisEndpoint};
use tracing::info;

use crate::build_ref::BuildRef;
use crate::error::Result;
use crate::tags::TagCodec;

/// Everything a release policy needs to act on behalf of the current build
#[derive(Clone, Copy)]
pub struct ReleaseContext<'a> {
    pub hosting: &'a dyn HostingClient,
    pub ci: &'a dyn CiStatusClient,
    pub codec: &'a TagCodec,
    pub build: &'a BuildRef,
    /// CI web UI, for links in generated release bodies
    pub travis: &'a TravisEndpoint,
}

impl<'a> ReleaseContext<'a> {
    /// Repository releases live in
    pub fn repo(&self) -> &'a str {
        &self.build.hosting_repo
    }

    /// Fetch every release of the hosting repository
    pub async fn list_releases(&self) -> Result<Vec<Release>> {
        Ok(self.hosting.list_releases(self.repo()).await?)
    }

    /// Whether the current build is still the most recent one for a branch or tag
    pub async fn is_latest_build(&self, branch_or_tag: &str) -> Result<bool> {
        let last = self
            .ci
            .last_build_number(&self.build.repo_slug, branch_or_tag)
            .await?;
        Ok(last == self.build.build_number)
    }

    /// Delete a release, and its tag too if the release was published
    ///
    /// Drafts never created a git tag, so there is nothing more to remove for them.
    pub async fn delete_release_with_tag(&self, release: &Release) -> Result<()> {
        info!(tag = %release.tag_name, "deleting release");
        self.hosting.delete_release(release).await?;

        if !release.draft {
            info!(tag = %release.tag_name, "deleting tag");
            self.hosting
                .delete_tag_ref(self.repo(), &release.tag_name)
                .await?;
        }
        Ok(())
    }

    /// Link to the current build's CI page
    pub fn build_url(&self) -> String {
        self.travis
            .build_url(&self.build.repo_slug, &self.build.build_id)
    }

    /// Link to the current job's CI page
    pub fn job_url(&self) -> String {
        self.travis.job_url(&self.build.repo_slug, &self.build.job_id)
    }
}
