//! Draft staging protocol
//!
//! Hosting providers cannot create a release with its assets atomically, so
//! every release is first created as a draft under a staging tag, filled with
//! assets, re-validated, and only then committed by renaming its tag and
//! setting its final flags in a single update:
//!
//! ```text
//! Absent -> Staged (draft, staging tag) -> Committed (final tag, final flags)
//!                                       \-> Aborted (deleted)
//! ```
//!
//! A release left under its staging tag is therefore always recognizable as
//! unfinished, and is reclaimed by a later cleanup pass.

use ci_release_publisher_providers::{NewRelease, Release, ReleaseUpdate};
use tracing::{info, warn};

use crate::artifacts::ArtifactDir;
use crate::context::ReleaseContext;
use crate::error::{PublisherError, Result};

/// What to do when a release already owns the final tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnExisting {
    /// Refuse to publish; the job was most likely restarted
    Fail,
    /// Delete the previous release right before committing the new one
    Replace {
        /// Keep the previous release's git tag instead of deleting it
        keep_tag: bool,
    },
}

/// Condition that must still hold before and after the upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recheck {
    /// Nothing can make the release stale
    Never,
    /// The current build must remain the last build of this branch or tag
    LatestBuildOf(String),
}

/// A release to stage and commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingPlan {
    pub final_tag: String,
    pub staging_tag: String,
    pub name: String,
    pub body: String,
    /// Final draft flag
    pub draft: bool,
    /// Prerelease flag, for both the staged and the committed release
    pub prerelease: bool,
    pub target_commitish: Option<String>,
    pub on_existing: OnExisting,
    pub recheck: Recheck,
}

/// How a staging attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagingOutcome {
    /// The release was committed under its final tag
    Committed(Release),
    /// The release went stale and was not published
    Aborted,
}

impl StagingOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }
}

async fn still_current(ctx: &ReleaseContext<'_>, plan: &StagingPlan) -> Result<bool> {
    match &plan.recheck {
        Recheck::Never => Ok(true),
        Recheck::LatestBuildOf(branch_or_tag) => {
            let latest = ctx.is_latest_build(branch_or_tag).await?;
            if !latest {
                info!(
                    tag = %plan.final_tag,
                    branch = %branch_or_tag,
                    "not publishing, this is no longer the latest build"
                );
            }
            Ok(latest)
        }
    }
}

/// Upload every file of the artifact directory, in name order
pub async fn upload_artifacts(
    ctx: &ReleaseContext<'_>,
    release: &Release,
    artifacts: &ArtifactDir,
) -> Result<()> {
    let files = artifacts.files()?;
    info!(
        tag = %release.tag_name,
        count = files.len(),
        dir = %artifacts.path().display(),
        "uploading artifacts"
    );

    for path in &files {
        let size = std::fs::metadata(path)?.len();
        info!(file = %path.display(), size, "uploading artifact");
        ctx.hosting.upload_asset(release, path).await?;
    }

    info!(tag = %release.tag_name, "all artifacts uploaded");
    Ok(())
}

/// Run the staging protocol for one release
///
/// `releases` is a listing taken before the call and is only used to find a
/// release already owning the final tag. Errors from the provider propagate
/// as-is and leave the staged release for cleanup.
pub async fn stage_and_commit(
    ctx: &ReleaseContext<'_>,
    releases: &[Release],
    plan: &StagingPlan,
    artifacts: &ArtifactDir,
) -> Result<StagingOutcome> {
    let existing = releases.iter().find(|r| r.tag_name == plan.final_tag);
    if existing.is_some() && plan.on_existing == OnExisting::Fail {
        return Err(PublisherError::DuplicateRelease {
            tag: plan.final_tag.clone(),
        });
    }

    if !still_current(ctx, plan).await? {
        return Ok(StagingOutcome::Aborted);
    }

    info!(tag = %plan.staging_tag, "creating draft release");
    let staged = ctx
        .hosting
        .create_release(
            ctx.repo(),
            &NewRelease {
                tag_name: plan.staging_tag.clone(),
                name: plan.name.clone(),
                body: plan.body.clone(),
                draft: true,
                prerelease: plan.prerelease,
                target_commitish: plan.target_commitish.clone(),
            },
        )
        .await?;

    upload_artifacts(ctx, &staged, artifacts).await?;

    if !still_current(ctx, plan).await? {
        ctx.delete_release_with_tag(&staged).await?;
        return Ok(StagingOutcome::Aborted);
    }

    if let (Some(previous), OnExisting::Replace { keep_tag }) = (existing, plan.on_existing) {
        if keep_tag {
            info!(tag = %previous.tag_name, "deleting previous release, keeping its tag");
            ctx.hosting.delete_release(previous).await?;
        } else {
            ctx.delete_release_with_tag(previous).await?;
        }
    }

    info!(
        from = %plan.staging_tag,
        to = %plan.final_tag,
        draft = plan.draft,
        "committing release"
    );
    let committed = ctx
        .hosting
        .update_release(
            &staged,
            &ReleaseUpdate {
                name: staged.title().to_string(),
                body: staged.body_text().to_string(),
                draft: plan.draft,
                prerelease: plan.prerelease,
                tag_name: Some(plan.final_tag.clone()),
            },
        )
        .await?;

    if committed.tag_name != plan.final_tag {
        warn!(
            expected = %plan.final_tag,
            actual = %committed.tag_name,
            "provider reported an unexpected tag after commit"
        );
    }

    Ok(StagingOutcome::Committed(committed))
}
