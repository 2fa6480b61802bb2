//! Rolling `latest` release per branch

use std::collections::BTreeSet;

use ci_release_publisher_providers::Release;
use tracing::info;

use super::{
    build_body, delete_best_effort, other_build_unfinished, target_commitish, text_or,
    PolicyOutcome,
};
use crate::artifacts::ArtifactDir;
use crate::context::ReleaseContext;
use crate::error::Result;
use crate::staging::{stage_and_commit, OnExisting, Recheck, StagingPlan};
use crate::tags::ReleaseIdentity;
use crate::types::{ReleaseKind, ReleaseOptions};

fn identity(ctx: &ReleaseContext<'_>) -> ReleaseIdentity {
    ReleaseIdentity::Latest {
        branch: ctx.build.branch.clone(),
    }
}

/// Replace the branch's latest release with the current build's artifacts
///
/// Does nothing on tag builds. Aborts when a newer build of the branch
/// shows up before or after the upload.
pub async fn publish(
    ctx: &ReleaseContext<'_>,
    releases: &[Release],
    options: &ReleaseOptions,
    artifacts: &ArtifactDir,
) -> Result<PolicyOutcome> {
    if ctx.build.is_tag_build() {
        info!("tag build, not publishing a latest release");
        return Ok(PolicyOutcome::Skipped);
    }

    let identity = identity(ctx);
    let branch = ctx.build.branch.clone();
    let final_tag = ctx.codec.encode(&identity, false);
    info!(tag = %final_tag, "publishing latest release");

    let plan = StagingPlan {
        staging_tag: ctx.codec.encode(&identity, true),
        name: text_or(&options.name, || format!("Latest CI build of {} branch", branch)),
        body: text_or(&options.body, || build_body(ctx)),
        draft: options.draft,
        prerelease: options.prerelease,
        target_commitish: target_commitish(ctx, options),
        on_existing: OnExisting::Replace { keep_tag: false },
        recheck: Recheck::LatestBuildOf(branch),
        final_tag,
    };

    Ok(stage_and_commit(ctx, releases, &plan, artifacts).await?.into())
}

/// Delete latest releases of this branch left under their staging tag
///
/// Skipped while another build of the branch is running, since it may be
/// the one staging.
pub async fn cleanup_incomplete(
    ctx: &ReleaseContext<'_>,
    releases: &[Release],
    unfinished: &BTreeSet<u64>,
) -> Vec<String> {
    if ctx.build.is_tag_build() {
        return Vec::new();
    }

    let incomplete: Vec<_> = releases
        .iter()
        .filter(|r| r.draft)
        .filter(|r| {
            ctx.codec
                .decode(ReleaseKind::Latest, true, &r.tag_name)
                .is_some_and(|id| id.branch_or_tag() == ctx.build.branch)
        })
        .collect();
    if incomplete.is_empty() || other_build_unfinished(ctx, unfinished) {
        return Vec::new();
    }

    info!(count = incomplete.len(), "deleting incomplete latest releases");
    delete_best_effort(ctx, incomplete).await
}
