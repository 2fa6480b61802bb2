//! Per-job temporary draft releases
//!
//! Every job of a build can `store` its artifacts in a draft release of its
//! own; a later job of the same build `collect`s them all. The drafts stay
//! drafts even once committed and are removed by cleanup.

use std::path::PathBuf;

use ci_release_publisher_providers::Release;
use tracing::info;

use super::{target_commitish, text_or};
use crate::artifacts::ArtifactDir;
use crate::context::ReleaseContext;
use crate::error::Result;
use crate::staging::{stage_and_commit, OnExisting, Recheck, StagingOutcome, StagingPlan};
use crate::tags::ReleaseIdentity;
use crate::types::{ReleaseKind, ReleaseOptions};

/// Identity of the current job's temporary release
pub fn identity(ctx: &ReleaseContext<'_>) -> ReleaseIdentity {
    ReleaseIdentity::Temporary {
        branch: ctx.build.branch_or_tag().to_string(),
        build_number: ctx.build.build_number,
        job_number: ctx.build.job_number,
    }
}

fn job_body(ctx: &ReleaseContext<'_>) -> String {
    format!(
        "Auto-generated temporary draft release containing build artifacts of \
         [Travis-CI job #{}]({}).\n\n\
         This release was created by `ci-release-publisher store` and will be \
         automatically deleted by `ci-release-publisher cleanup` command, so in \
         general you should never manually delete it, unless you don't use \
         `ci-release-publisher` anymore.",
        ctx.build.job_id,
        ctx.job_url()
    )
}

/// Store the artifact directory in a draft release for the current job
///
/// Only `name`, `body` and `target_commitish` of the options apply; the
/// release always stays a draft prerelease.
pub async fn store(
    ctx: &ReleaseContext<'_>,
    options: &ReleaseOptions,
    artifacts: &ArtifactDir,
) -> Result<StagingOutcome> {
    let identity = identity(ctx);
    let final_tag = ctx.codec.encode(&identity, false);
    info!(tag = %final_tag, "storing artifacts in a temporary draft release");

    let plan = StagingPlan {
        staging_tag: ctx.codec.encode(&identity, true),
        name: text_or(&options.name, || format!("Temporary draft release {}", final_tag)),
        body: text_or(&options.body, || job_body(ctx)),
        draft: true,
        prerelease: true,
        target_commitish: target_commitish(ctx, options),
        on_existing: OnExisting::Fail,
        recheck: Recheck::Never,
        final_tag,
    };

    let releases = ctx.list_releases().await?;
    stage_and_commit(ctx, &releases, &plan, artifacts).await
}

/// Committed temporary drafts of the current build, ordered by job number
pub fn stored_releases<'r>(ctx: &ReleaseContext<'_>, releases: &'r [Release]) -> Vec<&'r Release> {
    let mut stored: Vec<_> = releases
        .iter()
        .filter(|r| r.draft)
        .filter_map(|r| {
            let id = ctx.codec.decode(ReleaseKind::Temporary, false, &r.tag_name)?;
            let matches = id.branch_or_tag() == ctx.build.branch_or_tag()
                && id.build_number() == Some(ctx.build.build_number);
            matches.then(|| (id.job_number().unwrap_or_default(), r))
        })
        .collect();

    stored.sort_by_key(|(job, _)| *job);
    stored.into_iter().map(|(_, r)| r).collect()
}

/// Download the artifacts every job of the current build stored
///
/// Returns the downloaded files. Finding nothing to collect is not an error.
pub async fn collect(ctx: &ReleaseContext<'_>, dest: &ArtifactDir) -> Result<Vec<PathBuf>> {
    let releases = ctx.list_releases().await?;
    let stored = stored_releases(ctx, &releases);
    if stored.is_empty() {
        info!(
            build = ctx.build.build_number,
            "no draft releases with stored artifacts found for this build"
        );
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for release in stored {
        let assets = ctx.hosting.list_assets(release).await?;
        info!(tag = %release.tag_name, count = assets.len(), "downloading artifacts");

        for asset in &assets {
            info!(asset = %asset.name, size = asset.size, "downloading artifact");
            let path = ctx.hosting.download_asset(asset, dest.path()).await?;
            files.push(path);
        }
    }

    info!(count = files.len(), dir = %dest.path().display(), "all stored artifacts downloaded");
    Ok(files)
}
