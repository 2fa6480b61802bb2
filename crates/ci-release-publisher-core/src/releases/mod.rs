//! Release kind policies
//!
//! Each kind decides its tags, generated texts, race check and retention
//! around the shared staging protocol:
//!
//! - [`temporary`]: per-job drafts passing artifacts between jobs of one build
//! - [`latest`]: one rolling release per branch
//! - [`numbered`]: one release per build, with count and age retention
//! - [`tag`]: one release per pushed tag

pub mod latest;
pub mod numbered;
pub mod tag;
pub mod temporary;

use std::collections::BTreeSet;

use ci_release_publisher_providers::Release;
use tracing::{info, warn};

use crate::artifacts::ArtifactDir;
use crate::context::ReleaseContext;
use crate::error::{ConfigError, Result};
use crate::staging::StagingOutcome;
use crate::types::{ReleaseKind, ReleaseOptions, RetentionPolicy};

/// What a policy did for the current build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyOutcome {
    /// A release was committed
    Published(Release),
    /// The build went stale while staging; nothing was published
    Aborted,
    /// The kind does not apply to this build
    Skipped,
}

impl From<StagingOutcome> for PolicyOutcome {
    fn from(outcome: StagingOutcome) -> Self {
        match outcome {
            StagingOutcome::Committed(release) => Self::Published(release),
            StagingOutcome::Aborted => Self::Aborted,
        }
    }
}

/// Numbered release options with their retention thresholds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedOptions {
    pub release: ReleaseOptions,
    pub retention: RetentionPolicy,
}

/// Release kinds selected for `publish`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishRequest {
    pub latest: Option<ReleaseOptions>,
    pub numbered: Option<NumberedOptions>,
    pub tag: Option<ReleaseOptions>,
}

impl PublishRequest {
    pub fn is_empty(&self) -> bool {
        self.latest.is_none() && self.numbered.is_none() && self.tag.is_none()
    }
}

/// Publish every requested kind, in the order numbered, latest, tag
///
/// All kinds share one release listing, taken before any of them runs.
pub async fn publish_all(
    ctx: &ReleaseContext<'_>,
    request: &PublishRequest,
    artifacts: &ArtifactDir,
) -> Result<Vec<(ReleaseKind, PolicyOutcome)>> {
    if request.is_empty() {
        return Err(ConfigError::NoReleaseKind.into());
    }

    let releases = ctx.list_releases().await?;
    let mut outcomes = Vec::new();

    if let Some(options) = &request.numbered {
        let outcome = numbered::publish(ctx, &releases, options, artifacts).await?;
        outcomes.push((ReleaseKind::Numbered, outcome));
    }
    if let Some(options) = &request.latest {
        let outcome = latest::publish(ctx, &releases, options, artifacts).await?;
        outcomes.push((ReleaseKind::Latest, outcome));
    }
    if let Some(options) = &request.tag {
        let outcome = tag::publish(ctx, &releases, options, artifacts).await?;
        outcomes.push((ReleaseKind::Tag, outcome));
    }

    Ok(outcomes)
}

/// Generated text unless overridden
fn text_or(value: &Option<String>, generated: impl FnOnce() -> String) -> String {
    value.clone().unwrap_or_else(generated)
}

/// Body linking the current CI build
fn build_body(ctx: &ReleaseContext<'_>) -> String {
    format!(
        "This is an auto-generated release based on [Travis-CI build #{}]({})",
        ctx.build.build_id,
        ctx.build_url()
    )
}

fn target_commitish(ctx: &ReleaseContext<'_>, options: &ReleaseOptions) -> Option<String> {
    options
        .target_commitish
        .clone()
        .or_else(|| ctx.build.default_target_commitish())
}

/// Delete releases one by one, logging failures instead of stopping
///
/// Returns the tags that were deleted.
pub(crate) async fn delete_best_effort<'r>(
    ctx: &ReleaseContext<'_>,
    releases: impl IntoIterator<Item = &'r Release>,
) -> Vec<String> {
    let mut deleted = Vec::new();
    for release in releases {
        match ctx.delete_release_with_tag(release).await {
            Ok(()) => deleted.push(release.tag_name.clone()),
            Err(e) => warn!(tag = %release.tag_name, error = %e, "failed to delete release"),
        }
    }
    deleted
}

/// Whether some other build of this branch or tag is still running
fn other_build_unfinished(ctx: &ReleaseContext<'_>, unfinished: &BTreeSet<u64>) -> bool {
    let busy = unfinished.iter().any(|&n| n != ctx.build.build_number);
    if busy {
        info!(
            branch = %ctx.build.branch_or_tag(),
            ?unfinished,
            "other builds are still running, leaving incomplete releases alone"
        );
    }
    busy
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, Fixture};

    #[tokio::test]
    async fn test_publish_requires_a_kind() {
        let fixture = Fixture::new().with_artifacts(&["a.bin"]);
        let err = publish_all(&fixture.ctx(), &PublishRequest::default(), &fixture.artifacts())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::PublisherError::Config(ConfigError::NoReleaseKind)
        ));
        assert!(fixture.hosting.calls().is_empty());
    }

    #[tokio::test]
    async fn test_publish_runs_numbered_before_latest() {
        let fixture = Fixture::new().with_artifacts(&["a.bin"]);
        let request = PublishRequest {
            latest: Some(ReleaseOptions::default()),
            numbered: Some(NumberedOptions {
                release: ReleaseOptions::default(),
                retention: RetentionPolicy::new(10, 0).unwrap(),
            }),
            tag: Some(ReleaseOptions::default()),
        };

        let outcomes = publish_all(&fixture.ctx(), &request, &fixture.artifacts())
            .await
            .unwrap();

        let kinds: Vec<_> = outcomes.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![ReleaseKind::Numbered, ReleaseKind::Latest, ReleaseKind::Tag]
        );
        assert_eq!(outcomes[2].1, PolicyOutcome::Skipped);

        let creates: Vec<_> = fixture
            .hosting
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create(tag) => Some(tag),
                _ => None,
            })
            .collect();
        assert_eq!(creates, vec!["_ci-master-42", "_ci-master-latest"]);
        assert_eq!(
            fixture.hosting.release_tags(),
            vec!["ci-master-42", "ci-master-latest"]
        );
    }

    #[tokio::test]
    async fn test_best_effort_delete_continues_after_failure() {
        let fixture = Fixture::new();
        let first = fixture.hosting.seed("_ci-master-40-1-tmp", true);
        let second = fixture.hosting.seed("_ci-master-41-1-tmp", true);
        fixture.hosting.fail_deletes_of("_ci-master-40-1-tmp");

        let deleted = delete_best_effort(&fixture.ctx(), [&first, &second]).await;

        assert_eq!(deleted, vec!["_ci-master-41-1-tmp"]);
        assert_eq!(fixture.hosting.release_tags(), vec!["_ci-master-40-1-tmp"]);
    }
}
