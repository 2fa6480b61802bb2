//! Travis-CI API v3 client

use std::collections::BTreeSet;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

use super::endpoint::TravisEndpoint;
use crate::error::{ProviderError, Result};
use crate::http::{ensure_success, send_with_retry, RetryPolicy, USER_AGENT};
use crate::traits::CiStatusClient;

const API_VERSION_HEADER: &str = "Travis-API-Version";
const AUTH_MEDIA_TYPE: &str = "application/vnd.travis-ci.2.1+json";
const PAGE_LIMIT: u64 = 100;

/// Travis client configuration
#[derive(Debug, Clone)]
pub struct TravisConfig {
    /// Which installation to query
    pub endpoint: TravisEndpoint,

    /// GitHub token exchanged for a Travis session
    pub github_token: String,

    /// Transport retry policy
    pub retry: RetryPolicy,

    /// TCP connect timeout
    pub connect_timeout: Duration,
}

impl TravisConfig {
    pub fn new(endpoint: TravisEndpoint, github_token: impl Into<String>) -> Self {
        Self {
            endpoint,
            github_token: github_token.into(),
            retry: RetryPolicy::default(),
            connect_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct BranchResponse {
    last_build: Option<BuildSummary>,
}

#[derive(Debug, Deserialize)]
struct BuildSummary {
    number: String,
}

#[derive(Debug, Deserialize)]
struct BuildsPage {
    #[serde(rename = "@pagination")]
    pagination: Pagination,
    builds: Vec<Build>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    limit: u64,
    count: u64,
}

#[derive(Debug, Deserialize)]
struct Build {
    number: String,
    finished_at: Option<String>,
    branch: Option<NamedRef>,
    repository: Option<RepositoryRef>,
}

#[derive(Debug, Deserialize)]
struct NamedRef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RepositoryRef {
    slug: String,
}

#[derive(Debug, Deserialize)]
struct JobsResponse {
    jobs: Vec<Job>,
}

#[derive(Debug, Deserialize)]
struct Job {
    state: String,
    #[serde(default)]
    allow_failure: bool,
}

impl Build {
    fn belongs_to(&self, repo_slug: &str, branch: &str) -> bool {
        self.branch.as_ref().is_some_and(|b| b.name == branch)
            && self.repository.as_ref().is_some_and(|r| r.slug == repo_slug)
    }
}

fn parse_build_number(raw: &str) -> Result<u64> {
    raw.parse().map_err(|_| {
        ProviderError::InvalidResponse(format!("build number is not an integer: {:?}", raw))
    })
}

/// Travis-CI build status client
pub struct TravisClient {
    config: TravisConfig,
    client: Client,
    session: OnceCell<String>,
}

impl TravisClient {
    /// Create a new Travis client. No request is made until the first query.
    pub fn new(config: TravisConfig) -> Result<Self> {
        if config.github_token.is_empty() {
            return Err(ProviderError::Configuration(
                "GitHub token is empty".to_string(),
            ));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            config,
            client,
            session: OnceCell::new(),
        })
    }

    /// Build an API URL from raw path segments, percent-encoding each one
    fn endpoint_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.config.endpoint.api_url())?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::Configuration("invalid Travis API URL".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn session_token(&self) -> Result<&str> {
        let token = self
            .session
            .get_or_try_init(|| async {
                let url = self.endpoint_url(&["auth", "github"])?;
                debug!(%url, "exchanging GitHub token for a Travis session");

                let response = self
                    .client
                    .post(url)
                    .header(ACCEPT, AUTH_MEDIA_TYPE)
                    .query(&[("github_token", self.config.github_token.as_str())])
                    .send()
                    .await?;
                let auth: AuthResponse = ensure_success(response).await?.json().await?;

                info!("authenticated with Travis-CI");
                Ok::<_, ProviderError>(auth.access_token)
            })
            .await?;
        Ok(token.as_str())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let token = self.session_token().await?;
        let response = send_with_retry(&self.config.retry, &Method::GET, || {
            self.client
                .get(url.clone())
                .header(API_VERSION_HEADER, "3")
                .header(AUTHORIZATION, format!("token {}", token))
        })
        .await?;

        Ok(ensure_success(response).await?.json().await?)
    }
}

#[async_trait::async_trait]
impl CiStatusClient for TravisClient {
    #[instrument(skip(self))]
    async fn last_build_number(&self, repo_slug: &str, branch: &str) -> Result<u64> {
        let url = self.endpoint_url(&["repo", repo_slug, "branch", branch])?;
        let response: BranchResponse = self.get_json(url).await?;

        let last_build = response.last_build.ok_or_else(|| {
            ProviderError::InvalidResponse(format!("branch {} has no builds", branch))
        })?;
        let number = parse_build_number(&last_build.number)?;

        debug!(number, "last build number");
        Ok(number)
    }

    #[instrument(skip(self))]
    async fn unfinished_build_numbers(
        &self,
        repo_slug: &str,
        branch: &str,
    ) -> Result<BTreeSet<u64>> {
        let mut numbers = BTreeSet::new();
        let mut offset = 0u64;
        let mut count = 1u64;

        // Unfinished builds have a null finished_at and sort first
        while offset < count {
            let mut url = self.endpoint_url(&["repo", repo_slug, "builds"])?;
            url.query_pairs_mut()
                .append_pair("sort_by", "finished_at:desc")
                .append_pair("offset", &offset.to_string())
                .append_pair("limit", &PAGE_LIMIT.to_string());

            let page: BuildsPage = self.get_json(url).await?;
            if page.pagination.limit == 0 {
                break;
            }
            offset += page.pagination.limit;
            count = page.pagination.count;

            // Fork PRs may share the branch name, so the slug is matched too
            let branch_builds: Vec<&Build> = page
                .builds
                .iter()
                .filter(|b| b.belongs_to(repo_slug, branch))
                .collect();

            for build in branch_builds.iter().filter(|b| b.finished_at.is_none()) {
                numbers.insert(parse_build_number(&build.number)?);
            }

            if branch_builds.iter().any(|b| b.finished_at.is_some()) {
                break;
            }
        }

        debug!(count = numbers.len(), "unfinished builds");
        Ok(numbers)
    }

    #[instrument(skip(self))]
    async fn build_has_non_allowed_failing_job(&self, build_id: &str) -> Result<bool> {
        let url = self.endpoint_url(&["build", build_id, "jobs"])?;
        let response: JobsResponse = self.get_json(url).await?;

        Ok(response
            .jobs
            .iter()
            .any(|job| matches!(job.state.as_str(), "failed" | "errored") && !job.allow_failure))
    }
}
