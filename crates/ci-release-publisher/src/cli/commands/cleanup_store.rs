//! Cleanup store command

use std::collections::HashSet;

use clap::Args;
use tracing::info;

use ci_release_publisher_core::{cleanup_store, CleanupOptions, CleanupRelease, CleanupScope};

use super::{block_on, Session};
use crate::cli::{output, Cli};

/// Delete draft releases created by `store`
#[derive(Debug, Args)]
pub struct CleanupStoreCommand {
    /// Builds whose drafts to delete: current-job, current-build or
    /// previous-finished-builds. Repeatable. Defaults to current-job.
    #[arg(long = "scope", value_name = "SCOPE")]
    pub scopes: Vec<CleanupScope>,

    /// Drafts to delete: complete, incomplete. Repeatable. Defaults to both.
    #[arg(long = "release", value_name = "RELEASE")]
    pub releases: Vec<CleanupRelease>,

    /// Only clean up if a job of this build failed without being allowed to
    #[arg(long)]
    pub on_nonallowed_failure: bool,
}

impl CleanupStoreCommand {
    fn options(&self) -> CleanupOptions {
        let defaults = CleanupOptions::default();
        CleanupOptions {
            scopes: if self.scopes.is_empty() {
                defaults.scopes
            } else {
                self.scopes.iter().copied().collect::<HashSet<_>>()
            },
            releases: if self.releases.is_empty() {
                defaults.releases
            } else {
                self.releases.iter().copied().collect::<HashSet<_>>()
            },
            on_nonallowed_failure: self.on_nonallowed_failure,
        }
    }

    /// Execute the cleanup_store command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let options = self.options();
        info!(?options, "executing cleanup_store command");
        let config = cli.config()?;
        let session = Session::open(cli, config)?;

        let deleted = block_on(cleanup_store(&session.ctx(), &options))??;

        if !cli.quiet {
            output::info(&format!("Deleted {} draft release(s)", deleted.len()));
            for tag in &deleted {
                println!("{}", output::key_value("deleted", tag));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cmd = CleanupStoreCommand {
            scopes: Vec::new(),
            releases: Vec::new(),
            on_nonallowed_failure: false,
        };
        assert_eq!(cmd.options(), CleanupOptions::default());
    }

    #[test]
    fn test_explicit_selection_replaces_defaults() {
        let cmd = CleanupStoreCommand {
            scopes: vec![CleanupScope::CurrentBuild, CleanupScope::PreviousFinishedBuilds],
            releases: vec![CleanupRelease::Incomplete],
            on_nonallowed_failure: true,
        };
        let options = cmd.options();
        assert!(!options.scopes.contains(&CleanupScope::CurrentJob));
        assert_eq!(options.scopes.len(), 2);
        assert_eq!(options.releases, HashSet::from([CleanupRelease::Incomplete]));
        assert!(options.on_nonallowed_failure);
    }
}
