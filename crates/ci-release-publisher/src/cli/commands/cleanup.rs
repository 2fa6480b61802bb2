//! Cleanup command

use clap::Args;
use tracing::info;

use ci_release_publisher_core::cleanup_all;

use super::{block_on, Session};
use crate::cli::{output, Cli};

/// Delete this build's stored drafts and leftovers of earlier builds
#[derive(Debug, Args)]
pub struct CleanupCommand {}

impl CleanupCommand {
    /// Execute the cleanup command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing cleanup command");
        let config = cli.config()?;
        let session = Session::open(cli, config)?;

        let report = block_on(cleanup_all(&session.ctx()))??;

        if !cli.quiet {
            output::info(&format!("Deleted {} release(s)", report.total()));
            for (kind, tags) in [
                ("temporary", &report.temporary),
                ("latest", &report.latest),
                ("numbered", &report.numbered),
                ("tag", &report.tag),
            ] {
                if !tags.is_empty() {
                    println!("{}", output::key_value(kind, &tags.join(", ")));
                }
            }
        }
        Ok(())
    }
}
