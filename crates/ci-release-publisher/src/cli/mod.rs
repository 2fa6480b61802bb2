//! CLI definition and command handling

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

use ci_release_publisher_core::config::{load_config_or_default, validate_config};
use ci_release_publisher_core::PublisherConfig;
use ci_release_publisher_providers::TravisEndpoint;

use commands::{CleanupCommand, CleanupStoreCommand, CollectCommand, PublishCommand, StoreCommand};

/// ci-release-publisher - publish CI build artifacts as GitHub releases
#[derive(Debug, Parser)]
#[command(name = "ci-release-publisher")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Use the free Travis-CI service, https://travis-ci.org (default)
    #[arg(long, global = true, conflicts_with_all = ["travis_private", "travis_enterprise"])]
    pub travis_public: bool,

    /// Use the paid Travis-CI service, https://travis-ci.com
    #[arg(long, global = true, conflicts_with = "travis_enterprise")]
    pub travis_private: bool,

    /// Use a self-hosted Travis-CI instance. Give its web URL, not the API URL.
    #[arg(long, global = true, value_name = "TRAVIS_URL")]
    pub travis_enterprise: Option<String>,

    /// GitHub API root, e.g. for GitHub Enterprise
    #[arg(long, global = true, value_name = "URL")]
    pub github_api_url: Option<String>,

    /// Prefix of every tag this tool creates
    #[arg(long, global = true, value_name = "PREFIX")]
    pub tag_prefix: Option<String>,

    /// Prefix marking tags of releases that are still being staged
    #[arg(long, global = true, value_name = "PREFIX")]
    pub tag_prefix_tmp: Option<String>,

    /// GitHub access token
    #[arg(long, global = true, env = "GITHUB_ACCESS_TOKEN", hide_env_values = true, hide = true)]
    pub github_token: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Also write JSON logs to this directory, rotated daily
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Directory to search for a configuration file
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Store this job's artifacts in a draft release, for `collect` to pick up later
    Store(StoreCommand),

    /// Delete draft releases created by `store`, e.g. to undo it for the current job
    #[command(name = "cleanup_store")]
    CleanupStore(CleanupStoreCommand),

    /// Download the artifacts every job of this build stored
    Collect(CollectCommand),

    /// Delete this build's stored drafts and releases left incomplete by earlier builds
    Cleanup(CleanupCommand),

    /// Publish a directory of artifacts as latest, numbered and/or tag releases
    Publish(PublishCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(&self) -> anyhow::Result<()> {
        match &self.command {
            Commands::Store(cmd) => cmd.execute(self),
            Commands::CleanupStore(cmd) => cmd.execute(self),
            Commands::Collect(cmd) => cmd.execute(self),
            Commands::Cleanup(cmd) => cmd.execute(self),
            Commands::Publish(cmd) => cmd.execute(self),
        }
    }

    fn travis_endpoint(&self) -> Option<TravisEndpoint> {
        if let Some(url) = &self.travis_enterprise {
            Some(TravisEndpoint::Enterprise(url.clone()))
        } else if self.travis_private {
            Some(TravisEndpoint::Private)
        } else if self.travis_public {
            Some(TravisEndpoint::Public)
        } else {
            None
        }
    }

    /// Resolve configuration: defaults, then the config file, then flags
    pub fn config(&self) -> anyhow::Result<PublisherConfig> {
        let dir = match &self.directory {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        let (mut config, path) = load_config_or_default(&dir)?;
        if let Some(path) = path {
            debug!(path = %path.display(), "using config file");
        }

        if let Some(endpoint) = self.travis_endpoint() {
            config.travis = endpoint;
        }
        if let Some(url) = &self.github_api_url {
            config.github_api_url = url.clone();
        }
        if let Some(prefix) = &self.tag_prefix {
            config.tag_prefix = prefix.clone();
        }
        if let Some(prefix) = &self.tag_prefix_tmp {
            config.tag_prefix_tmp = prefix.clone();
        }

        validate_config(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_travis_flags() {
        let cli = Cli::parse_from(["ci-release-publisher", "--travis-private", "cleanup"]);
        assert_eq!(cli.travis_endpoint(), Some(TravisEndpoint::Private));

        let cli = Cli::parse_from([
            "ci-release-publisher",
            "cleanup",
            "--travis-enterprise",
            "https://travis.example.com",
        ]);
        assert_eq!(
            cli.travis_endpoint(),
            Some(TravisEndpoint::Enterprise("https://travis.example.com".to_string()))
        );

        assert!(Cli::try_parse_from([
            "ci-release-publisher",
            "--travis-public",
            "--travis-private",
            "cleanup"
        ])
        .is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("ci-release-publisher.toml"),
            "tag_prefix = \"build\"\ntag_prefix_tmp = \"wip-\"\n",
        )
        .unwrap();

        let cli = Cli::parse_from([
            "ci-release-publisher",
            "-C",
            temp.path().to_str().unwrap(),
            "--tag-prefix",
            "nightly",
            "cleanup",
        ]);
        let config = cli.config().unwrap();
        assert_eq!(config.tag_prefix, "nightly");
        assert_eq!(config.tag_prefix_tmp, "wip-");
    }

    #[test]
    fn test_empty_prefix_is_rejected() {
        let temp = tempfile::TempDir::new().unwrap();
        let cli = Cli::parse_from([
            "ci-release-publisher",
            "-C",
            temp.path().to_str().unwrap(),
            "--tag-prefix",
            "",
            "cleanup",
        ]);
        assert!(cli.config().is_err());
    }

    #[test]
    fn test_cleanup_store_name() {
        let cli = Cli::parse_from([
            "ci-release-publisher",
            "cleanup_store",
            "--scope",
            "previous-finished-builds",
            "--release",
            "incomplete",
        ]);
        assert!(matches!(cli.command, Commands::CleanupStore(_)));
    }
}
