//! Publish command

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use ci_release_publisher_core::{
    publish_all, ArtifactDir, ConfigError, NumberedOptions, PolicyOutcome, PublishRequest,
    ReleaseOptions, RetentionPolicy,
};

use super::{block_on, Session};
use crate::cli::{output, Cli};

/// Publish a directory of artifacts
#[derive(Debug, Args)]
pub struct PublishCommand {
    /// Directory containing the artifacts to publish
    #[arg(value_name = "ARTIFACT_DIR")]
    pub artifact_dir: PathBuf,

    /// Publish a "<prefix>-<branch>-latest" release, re-created by every build of the branch
    #[arg(long, help_heading = "Latest release")]
    pub latest_release: bool,

    /// Latest release title
    #[arg(long, help_heading = "Latest release")]
    pub latest_release_name: Option<String>,

    /// Latest release body
    #[arg(long, help_heading = "Latest release")]
    pub latest_release_body: Option<String>,

    /// Publish the latest release as a draft
    #[arg(long, help_heading = "Latest release")]
    pub latest_release_draft: bool,

    /// Publish the latest release as a prerelease
    #[arg(long, help_heading = "Latest release")]
    pub latest_release_prerelease: bool,

    /// Commit the latest release points to. Defaults to $TRAVIS_COMMIT when
    /// publishing to the same repository, unset otherwise.
    #[arg(long, help_heading = "Latest release")]
    pub latest_release_target_commitish: Option<String>,

    /// Publish a "<prefix>-<branch>-<build>" release for every build
    #[arg(long, help_heading = "Numbered release")]
    pub numbered_release: bool,

    /// How many numbered releases to keep per branch, 0 for no limit
    #[arg(long, default_value_t = 0, help_heading = "Numbered release")]
    pub numbered_release_keep_count: u64,

    /// Maximum age of numbered releases in seconds, 0 for no limit
    #[arg(long, default_value_t = 0, value_name = "SECONDS", help_heading = "Numbered release")]
    pub numbered_release_keep_time: u64,

    /// Numbered release title
    #[arg(long, help_heading = "Numbered release")]
    pub numbered_release_name: Option<String>,

    /// Numbered release body
    #[arg(long, help_heading = "Numbered release")]
    pub numbered_release_body: Option<String>,

    /// Publish numbered releases as drafts
    #[arg(long, help_heading = "Numbered release")]
    pub numbered_release_draft: bool,

    /// Publish numbered releases as prereleases
    #[arg(long, help_heading = "Numbered release")]
    pub numbered_release_prerelease: bool,

    /// Publish a release for a pushed tag, named after the tag
    #[arg(long, help_heading = "Tag release")]
    pub tag_release: bool,

    /// Tag release title
    #[arg(long, help_heading = "Tag release")]
    pub tag_release_name: Option<String>,

    /// Tag release body
    #[arg(long, help_heading = "Tag release")]
    pub tag_release_body: Option<String>,

    /// Publish the tag release as a draft
    #[arg(long, help_heading = "Tag release")]
    pub tag_release_draft: bool,

    /// Publish the tag release as a prerelease
    #[arg(long, help_heading = "Tag release")]
    pub tag_release_prerelease: bool,
}

impl PublishCommand {
    /// Requested kinds, checked before anything touches the network
    fn request(&self) -> anyhow::Result<PublishRequest> {
        let latest = self.latest_release.then(|| ReleaseOptions {
            name: self.latest_release_name.clone(),
            body: self.latest_release_body.clone(),
            draft: self.latest_release_draft,
            prerelease: self.latest_release_prerelease,
            target_commitish: self.latest_release_target_commitish.clone(),
        });

        let numbered = if self.numbered_release {
            Some(NumberedOptions {
                release: ReleaseOptions {
                    name: self.numbered_release_name.clone(),
                    body: self.numbered_release_body.clone(),
                    draft: self.numbered_release_draft,
                    prerelease: self.numbered_release_prerelease,
                    target_commitish: None,
                },
                retention: RetentionPolicy::new(
                    self.numbered_release_keep_count,
                    self.numbered_release_keep_time,
                )?,
            })
        } else {
            None
        };

        let tag = self.tag_release.then(|| ReleaseOptions {
            name: self.tag_release_name.clone(),
            body: self.tag_release_body.clone(),
            draft: self.tag_release_draft,
            prerelease: self.tag_release_prerelease,
            target_commitish: None,
        });

        let request = PublishRequest {
            latest,
            numbered,
            tag,
        };
        if request.is_empty() {
            return Err(ConfigError::NoReleaseKind.into());
        }
        Ok(request)
    }

    /// Execute the publish command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(dir = %self.artifact_dir.display(), "executing publish command");
        let config = cli.config()?;
        let artifacts = ArtifactDir::open(&self.artifact_dir)?;
        let request = self.request()?;
        let session = Session::open(cli, config)?;

        let outcomes = block_on(publish_all(&session.ctx(), &request, &artifacts))??;

        if !cli.quiet {
            for (kind, outcome) in outcomes {
                match outcome {
                    PolicyOutcome::Published(release) => output::success(&format!(
                        "Published {} release {}",
                        kind,
                        output::tag_style().apply_to(&release.tag_name)
                    )),
                    PolicyOutcome::Aborted => output::warning(&format!(
                        "Skipped {} release, a newer build is running",
                        kind
                    )),
                    PolicyOutcome::Skipped => {
                        output::info(&format!("No {} release for this build", kind))
                    }
                }
            }
        }
        Ok(())
    }
}
