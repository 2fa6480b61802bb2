//! One release per build, pruned by count and age

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use ci_release_publisher_providers::Release;
use tracing::info;

use super::{
    build_body, delete_best_effort, target_commitish, text_or, NumberedOptions, PolicyOutcome,
};
use crate::artifacts::ArtifactDir;
use crate::context::ReleaseContext;
use crate::error::{PublisherError, Result};
use crate::staging::{stage_and_commit, OnExisting, Recheck, StagingPlan};
use crate::tags::ReleaseIdentity;
use crate::types::{ReleaseKind, RetentionPolicy};

/// Committed numbered releases of the branch older than the current build,
/// oldest first
fn previous_releases<'r>(ctx: &ReleaseContext<'_>, releases: &'r [Release]) -> Vec<&'r Release> {
    let mut previous: Vec<_> = releases
        .iter()
        .filter_map(|r| {
            let id = ctx.codec.decode(ReleaseKind::Numbered, false, &r.tag_name)?;
            let build = id.build_number()?;
            (id.branch_or_tag() == ctx.build.branch && build < ctx.build.build_number)
                .then_some((build, r))
        })
        .collect();

    previous.sort_by_key(|(build, _)| *build);
    previous.into_iter().map(|(_, r)| r).collect()
}

/// Pick the releases to delete so the branch stays within the retention policy
/// once the current build's release is added
fn select_expired<'r>(
    previous: Vec<&'r Release>,
    retention: &RetentionPolicy,
    now: DateTime<Utc>,
) -> Vec<&'r Release> {
    let mut remaining = previous;
    let mut expired = Vec::new();

    if retention.keep_count > 0 {
        let total = remaining.len() as u64 + 1;
        let excess = total.saturating_sub(retention.keep_count) as usize;
        expired.extend(remaining.drain(..excess.min(remaining.len())));
    }

    if retention.keep_age_seconds > 0 {
        let max_age = i64::try_from(retention.keep_age_seconds).unwrap_or(i64::MAX);
        expired.extend(
            remaining
                .into_iter()
                .filter(|r| (now - r.created_at).num_seconds() > max_age),
        );
    }

    expired
}

/// Delete numbered releases of the branch exceeding the retention policy
///
/// Returns the deleted tags.
pub async fn apply_retention(
    ctx: &ReleaseContext<'_>,
    releases: &[Release],
    retention: &RetentionPolicy,
) -> Result<Vec<String>> {
    let previous = previous_releases(ctx, releases);
    let found = previous.len();
    let expired = select_expired(previous, retention, Utc::now());
    info!(
        branch = %ctx.build.branch,
        keep_count = retention.keep_count,
        keep_age_seconds = retention.keep_age_seconds,
        found,
        expired = expired.len(),
        "applying numbered release retention"
    );

    let mut deleted = Vec::new();
    for release in expired {
        ctx.delete_release_with_tag(release).await?;
        deleted.push(release.tag_name.clone());
    }
    Ok(deleted)
}

/// Publish the current build as a numbered release
///
/// Does nothing on tag builds. Old numbered releases are pruned before the
/// new one is staged.
pub async fn publish(
    ctx: &ReleaseContext<'_>,
    releases: &[Release],
    options: &NumberedOptions,
    artifacts: &ArtifactDir,
) -> Result<PolicyOutcome> {
    if ctx.build.is_tag_build() {
        info!("tag build, not publishing a numbered release");
        return Ok(PolicyOutcome::Skipped);
    }

    let identity = ReleaseIdentity::Numbered {
        branch: ctx.build.branch.clone(),
        build_number: ctx.build.build_number,
    };
    let release = &options.release;
    let final_tag = ctx.codec.encode(&identity, false);
    info!(tag = %final_tag, "publishing numbered release");

    let plan = StagingPlan {
        staging_tag: ctx.codec.encode(&identity, true),
        name: text_or(&release.name, || {
            format!(
                "CI build of {} branch #{}",
                ctx.build.branch, ctx.build.build_number
            )
        }),
        body: text_or(&release.body, || build_body(ctx)),
        draft: release.draft,
        prerelease: release.prerelease,
        target_commitish: target_commitish(ctx, release),
        on_existing: OnExisting::Fail,
        recheck: Recheck::Never,
        final_tag,
    };

    if releases.iter().any(|r| r.tag_name == plan.final_tag) {
        return Err(PublisherError::DuplicateRelease {
            tag: plan.final_tag,
        });
    }

    apply_retention(ctx, releases, &options.retention).await?;
    Ok(stage_and_commit(ctx, releases, &plan, artifacts).await?.into())
}

/// Delete numbered releases of this branch left under their staging tag
///
/// Only the current build's and finished earlier builds' leftovers are
/// touched.
pub async fn cleanup_incomplete(
    ctx: &ReleaseContext<'_>,
    releases: &[Release],
    unfinished: &BTreeSet<u64>,
) -> Vec<String> {
    if ctx.build.is_tag_build() {
        return Vec::new();
    }

    let current = ctx.build.build_number;
    let incomplete: Vec<_> = releases
        .iter()
        .filter(|r| r.draft)
        .filter(|r| {
            ctx.codec
                .decode(ReleaseKind::Numbered, true, &r.tag_name)
                .is_some_and(|id| {
                    let build = id.build_number().unwrap_or(u64::MAX);
                    id.branch_or_tag() == ctx.build.branch
                        && (build == current || (build < current && !unfinished.contains(&build)))
                })
        })
        .collect();
    if incomplete.is_empty() {
        return Vec::new();
    }

    info!(count = incomplete.len(), "deleting incomplete numbered releases");
    delete_best_effort(ctx, incomplete).await
}
