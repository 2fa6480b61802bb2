//! CLI commands

mod cleanup;
mod cleanup_store;
mod collect;
mod publish;
mod store;

pub use cleanup::CleanupCommand;
pub use cleanup_store::CleanupStoreCommand;
pub use collect::CollectCommand;
pub use publish::PublishCommand;
pub use store::StoreCommand;

use tracing::debug;

use ci_release_publisher_core::{BuildRef, ConfigError, PublisherConfig, ReleaseContext, TagCodec};
use ci_release_publisher_providers::{GitHubClient, GitHubConfig, TravisClient, TravisConfig};

use crate::cli::Cli;

/// Everything a command needs to talk to GitHub and Travis-CI for this build
pub struct Session {
    pub config: PublisherConfig,
    pub build: BuildRef,
    codec: TagCodec,
    github: GitHubClient,
    travis: TravisClient,
}

impl Session {
    /// Read the build environment and set up the provider clients
    ///
    /// No network calls are made here; the Travis-CI session is opened on
    /// first use.
    pub fn open(cli: &Cli, config: PublisherConfig) -> anyhow::Result<Self> {
        let build = BuildRef::from_env()?;
        let token = cli
            .github_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("GITHUB_ACCESS_TOKEN".to_string()))?;

        let codec = TagCodec::new(&config.tag_prefix, &config.tag_prefix_tmp)?;
        let retry = config.http.retry_policy();

        let mut github_config = GitHubConfig::new(token.clone())
            .with_api_url(config.github_api_url.clone())
            .with_retry(retry);
        github_config.connect_timeout = config.http.connect_timeout();
        let github = GitHubClient::new(github_config)?;

        let mut travis_config = TravisConfig::new(config.travis.clone(), token).with_retry(retry);
        travis_config.connect_timeout = config.http.connect_timeout();
        let travis = TravisClient::new(travis_config)?;

        debug!(
            repo = %build.hosting_repo,
            branch = %build.branch_or_tag(),
            build = build.build_number,
            job = build.job_number,
            "session ready"
        );

        Ok(Self {
            config,
            build,
            codec,
            github,
            travis,
        })
    }

    pub fn ctx(&self) -> ReleaseContext<'_> {
        ReleaseContext {
            hosting: &self.github,
            ci: &self.travis,
            codec: &self.codec,
            build: &self.build,
            travis: &self.config.travis,
        }
    }
}

/// Run a future to completion on a fresh runtime
pub(crate) fn block_on<F: std::future::Future>(future: F) -> anyhow::Result<F::Output> {
    let runtime = tokio::runtime::Runtime::new()?;
    Ok(runtime.block_on(future))
}
