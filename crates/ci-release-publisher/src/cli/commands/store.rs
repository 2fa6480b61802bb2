//! Store command

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use ci_release_publisher_core::releases::temporary;
use ci_release_publisher_core::{ArtifactDir, ReleaseOptions, StagingOutcome};

use super::{block_on, Session};
use crate::cli::{output, Cli};

/// Store this job's artifacts in a draft release
#[derive(Debug, Args)]
pub struct StoreCommand {
    /// Directory containing the artifacts to store
    #[arg(value_name = "ARTIFACT_DIR")]
    pub artifact_dir: PathBuf,

    /// Release title. A generated one is used if not given.
    #[arg(long)]
    pub release_name: Option<String>,

    /// Release body. A generated one is used if not given.
    #[arg(long)]
    pub release_body: Option<String>,
}

impl StoreCommand {
    /// Execute the store command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(dir = %self.artifact_dir.display(), "executing store command");
        let config = cli.config()?;
        let artifacts = ArtifactDir::open(&self.artifact_dir)?;
        let session = Session::open(cli, config)?;

        let options = ReleaseOptions {
            name: self.release_name.clone(),
            body: self.release_body.clone(),
            ..Default::default()
        };
        let outcome = block_on(temporary::store(&session.ctx(), &options, &artifacts))??;

        if !cli.quiet {
            if let StagingOutcome::Committed(release) = outcome {
                output::success(&format!(
                    "Stored {} artifact(s) in draft release {}",
                    release.assets.len(),
                    output::tag_style().apply_to(&release.tag_name)
                ));
            }
        }
        Ok(())
    }
}
