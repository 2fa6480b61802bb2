//! Cleanup of stored and incomplete releases
//!
//! Temporary drafts are selected by scope (which builds) and filter (committed
//! or still staging). Deletions are best-effort: a failure is logged and the
//! rest of the batch still runs.

use std::collections::{BTreeSet, HashSet};

use ci_release_publisher_providers::Release;
use tracing::info;

use crate::context::ReleaseContext;
use crate::error::Result;
use crate::releases::{self, delete_best_effort};
use crate::tags::TagIdentity;
use crate::types::{CleanupRelease, CleanupScope, ReleaseKind};

/// Which temporary drafts a cleanup pass deletes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupOptions {
    pub scopes: HashSet<CleanupScope>,
    pub releases: HashSet<CleanupRelease>,
    /// Only clean up when some job of the build failed without being allowed to
    pub on_nonallowed_failure: bool,
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self {
            scopes: HashSet::from([CleanupScope::CurrentJob]),
            releases: HashSet::from([CleanupRelease::Complete, CleanupRelease::Incomplete]),
            on_nonallowed_failure: false,
        }
    }
}

/// What a full `cleanup` deleted, by kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub temporary: Vec<String>,
    pub latest: Vec<String>,
    pub numbered: Vec<String>,
    pub tag: Vec<String>,
}

impl CleanupReport {
    pub fn total(&self) -> usize {
        self.temporary.len() + self.latest.len() + self.numbered.len() + self.tag.len()
    }
}

async fn should_run(ctx: &ReleaseContext<'_>, options: &CleanupOptions) -> Result<bool> {
    if !options.on_nonallowed_failure || ctx.build.job_failed_without_permission() {
        return Ok(true);
    }

    let failing = ctx
        .ci
        .build_has_non_allowed_failing_job(&ctx.build.build_id)
        .await?;
    if !failing {
        info!(
            build_id = %ctx.build.build_id,
            "no job failed without being allowed to, nothing to clean up"
        );
    }
    Ok(failing)
}

/// Temporary drafts matching the cleanup options, ordered by build then job
fn select<'r>(
    ctx: &ReleaseContext<'_>,
    releases: &'r [Release],
    options: &CleanupOptions,
    unfinished: &BTreeSet<u64>,
) -> Vec<&'r Release> {
    let build = ctx.build;

    let in_scope = |build_number: u64, job_number: u64| {
        options.scopes.iter().any(|scope| match scope {
            CleanupScope::CurrentJob => {
                build_number == build.build_number && job_number == build.job_number
            }
            CleanupScope::CurrentBuild => build_number == build.build_number,
            CleanupScope::PreviousFinishedBuilds => {
                build_number < build.build_number && !unfinished.contains(&build_number)
            }
        })
    };

    let mut selected: Vec<_> = releases
        .iter()
        .filter(|r| r.draft)
        .filter_map(|r| {
            let TagIdentity { release, staging } = ctx.codec.classify(&r.tag_name)?;
            let state = if staging {
                CleanupRelease::Incomplete
            } else {
                CleanupRelease::Complete
            };
            if release.kind() != ReleaseKind::Temporary || !options.releases.contains(&state) {
                return None;
            }

            let key = (release.build_number()?, release.job_number()?);
            (release.branch_or_tag() == build.branch_or_tag() && in_scope(key.0, key.1))
                .then_some((key, r))
        })
        .collect();

    selected.sort_by_key(|(key, _)| *key);
    selected.into_iter().map(|(_, r)| r).collect()
}

/// Delete temporary drafts selected by `options`, from a given listing
///
/// Returns the deleted tags.
pub async fn cleanup_temporary(
    ctx: &ReleaseContext<'_>,
    releases: &[Release],
    options: &CleanupOptions,
) -> Result<Vec<String>> {
    if !should_run(ctx, options).await? {
        return Ok(Vec::new());
    }

    let unfinished = if options.scopes.contains(&CleanupScope::PreviousFinishedBuilds) {
        ctx.ci
            .unfinished_build_numbers(&ctx.build.repo_slug, ctx.build.branch_or_tag())
            .await?
    } else {
        BTreeSet::new()
    };

    let selected = select(ctx, releases, options, &unfinished);
    info!(
        branch = %ctx.build.branch_or_tag(),
        count = selected.len(),
        "deleting temporary draft releases"
    );
    Ok(delete_best_effort(ctx, selected).await)
}

/// Undo `store` according to `options` (the `cleanup_store` command)
pub async fn cleanup_store(
    ctx: &ReleaseContext<'_>,
    options: &CleanupOptions,
) -> Result<Vec<String>> {
    let releases = ctx.list_releases().await?;
    cleanup_temporary(ctx, &releases, options).await
}

/// Delete everything this build and finished earlier builds left behind
/// (the `cleanup` command)
///
/// Covers this build's and finished builds' temporary drafts, plus staged
/// latest, numbered and tag releases that never got committed.
pub async fn cleanup_all(ctx: &ReleaseContext<'_>) -> Result<CleanupReport> {
    let releases = ctx.list_releases().await?;
    let unfinished = ctx
        .ci
        .unfinished_build_numbers(&ctx.build.repo_slug, ctx.build.branch_or_tag())
        .await?;

    let options = CleanupOptions {
        scopes: HashSet::from([
            CleanupScope::CurrentBuild,
            CleanupScope::PreviousFinishedBuilds,
        ]),
        ..Default::default()
    };
    let temporary = select(ctx, &releases, &options, &unfinished);
    info!(
        branch = %ctx.build.branch_or_tag(),
        count = temporary.len(),
        "deleting temporary draft releases"
    );

    Ok(CleanupReport {
        temporary: delete_best_effort(ctx, temporary).await,
        latest: releases::latest::cleanup_incomplete(ctx, &releases, &unfinished).await,
        numbered: releases::numbered::cleanup_incomplete(ctx, &releases, &unfinished).await,
        tag: releases::tag::cleanup_incomplete(ctx, &releases, &unfinished).await,
    })
}
