//! Collect command

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use ci_release_publisher_core::releases::temporary;
use ci_release_publisher_core::ArtifactDir;

use super::{block_on, Session};
use crate::cli::{output, Cli};

/// Download the artifacts stored by every job of this build
#[derive(Debug, Args)]
pub struct CollectCommand {
    /// Directory to download the artifacts into. It must exist.
    #[arg(value_name = "ARTIFACT_DIR")]
    pub artifact_dir: PathBuf,
}

impl CollectCommand {
    /// Execute the collect command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(dir = %self.artifact_dir.display(), "executing collect command");
        let config = cli.config()?;
        let dest = ArtifactDir::open_existing(&self.artifact_dir)?;
        let session = Session::open(cli, config)?;

        let files = block_on(temporary::collect(&session.ctx(), &dest))??;

        if !cli.quiet {
            if files.is_empty() {
                output::warning("No stored artifacts found for this build");
            } else {
                output::success(&format!(
                    "Collected {} artifact(s) into {}",
                    files.len(),
                    output::path_style().apply_to(dest.path().display())
                ));
            }
        }
        Ok(())
    }
}
