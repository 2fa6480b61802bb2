//! Release for a pushed tag

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

/// Publish the pushed tag's release
///
/// Does nothing unless the build was triggered by a tag. A release already on
/// the tag is replaced, but the git tag itself is kept since the user pushed it.
pub async fn publish(
    ctx: &ReleaseContext<'_>,
    releases: &[Release],
    options: &ReleaseOptions,
    artifacts: &ArtifactDir,
) -> Result<PolicyOutcome> {
    let Some(tag) = ctx.build.tag.clone() else {
        info!("no tag was pushed, not publishing a tag release");
        return Ok(PolicyOutcome::Skipped);
    };

    let identity = ReleaseIdentity::Tag { tag: tag.clone() };
    info!(tag = %tag, "publishing tag release");

    let plan = StagingPlan {
        final_tag: ctx.codec.encode(&identity, false),
        staging_tag: ctx.codec.encode(&identity, true),
        name: text_or(&options.name, || tag.clone()),
        body: text_or(&options.body, || build_body(ctx)),
        draft: options.draft,
        prerelease: options.prerelease,
        target_commitish: target_commitish(ctx, options),
        on_existing: OnExisting::Replace { keep_tag: true },
        recheck: Recheck::LatestBuildOf(tag),
    };

    Ok(stage_and_commit(ctx, releases, &plan, artifacts).await?.into())
}

/// Delete this tag's releases left under their staging tag
///
/// Only runs on tag builds, and not while another build of the tag is running.
pub async fn cleanup_incomplete(
    ctx: &ReleaseContext<'_>,
    releases: &[Release],
    unfinished: &BTreeSet<u64>,
) -> Vec<String> {
    let Some(tag) = ctx.build.tag.as_deref() else {
        return Vec::new();
    };

    let incomplete: Vec<_> = releases
        .iter()
        .filter(|r| r.draft)
        .filter(|r| {
            ctx.codec
                .decode(ReleaseKind::Tag, true, &r.tag_name)
                .is_some_and(|id| id.branch_or_tag() == tag)
        })
        .collect();
    if incomplete.is_empty() || other_build_unfinished(ctx, unfinished) {
        return Vec::new();
    }

    info!(count = incomplete.len(), "deleting incomplete tag releases");
    delete_best_effort(ctx, incomplete).await
}
