//! GitHub REST client

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

use super::disposition::content_disposition_filename;
use crate::error::{ProviderError, Result};
use crate::http::{ensure_success, send_with_retry, RetryPolicy, USER_AGENT};
use crate::traits::HostingClient;
use crate::types::*;

/// Public GitHub API root
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const JSON_MEDIA_TYPE: &str = "application/vnd.github.v3+json";
const BINARY_MEDIA_TYPE: &str = "application/octet-stream";
const PAGE_SIZE: usize = 100;

/// GitHub client configuration
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// API root (default: "https://api.github.com")
    pub api_url: String,

    /// Personal access token
    pub token: String,

    /// Transport retry policy
    pub retry: RetryPolicy,

    /// TCP connect timeout. Transfers themselves are not bounded.
    pub connect_timeout: Duration,
}

impl GitHubConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: token.into(),
            retry: RetryPolicy::default(),
            connect_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// GitHub releases client
pub struct GitHubClient {
    config: GitHubConfig,
    client: Client,
}

impl GitHubClient {
    /// Create a new GitHub client
    pub fn new(config: GitHubConfig) -> Result<Self> {
        if config.token.is_empty() {
            return Err(ProviderError::Configuration(
                "GitHub token is empty".to_string(),
            ));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self { config, client })
    }

    /// `{api}/repos/{owner}/{repo}/...`, with every segment percent-encoded
    ///
    /// Tag names come from branch names and may contain `#`, `?` or `%`.
    fn repo_url(&self, repo: &str, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.config.api_url)?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::Configuration("invalid GitHub API URL".to_string()))?
            .pop_if_empty()
            .push("repos")
            .extend(repo.split('/'))
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.request_accepting(method, url, JSON_MEDIA_TYPE)
    }

    fn request_accepting(&self, method: Method, url: &str, accept: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(AUTHORIZATION, format!("token {}", self.config.token))
            .header(ACCEPT, accept)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<T> {
        let response = send_with_retry(&self.config.retry, &method, || {
            let request = self.request(method.clone(), url);
            match body {
                Some(body) => request.json(body),
                None => request,
            }
        })
        .await?;

        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }

    async fn send_empty(&self, method: Method, url: &str) -> Result<()> {
        let response =
            send_with_retry(&self.config.retry, &method, || self.request(method.clone(), url))
                .await?;
        ensure_success(response).await?;
        Ok(())
    }

    fn release_url<'a>(&self, release: &'a Release) -> Result<&'a str> {
        if release.url.is_empty() {
            return Err(ProviderError::InvalidResponse(format!(
                "release {} has no API URL",
                release.tag_name
            )));
        }
        Ok(&release.url)
    }

    /// Upload endpoint with the `{?name,label}` template stripped and the name filled in
    fn upload_target(release: &Release, file_name: &str) -> Result<Url> {
        let base = release
            .upload_url
            .split('{')
            .next()
            .unwrap_or_default();
        if base.is_empty() {
            return Err(ProviderError::InvalidResponse(format!(
                "release {} has no upload URL",
                release.tag_name
            )));
        }

        let mut url = Url::parse(base)?;
        url.query_pairs_mut().append_pair("name", file_name);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl HostingClient for GitHubClient {
    #[instrument(skip(self))]
    async fn list_releases(&self, repo: &str) -> Result<Vec<Release>> {
        let mut releases = Vec::new();
        let mut page = 1;

        loop {
            let mut url = self.repo_url(repo, &["releases"])?;
            url.query_pairs_mut()
                .append_pair("per_page", &PAGE_SIZE.to_string())
                .append_pair("page", &page.to_string());
            let batch: Vec<Release> = self.send_json(Method::GET, url.as_str(), None).await?;
            let done = batch.len() < PAGE_SIZE;
            releases.extend(batch);
            if done {
                break;
            }
            page += 1;
        }

        debug!(count = releases.len(), "listed releases");
        Ok(releases)
    }

    #[instrument(skip(self, release), fields(tag = %release.tag_name))]
    async fn create_release(&self, repo: &str, release: &NewRelease) -> Result<Release> {
        let url = self.repo_url(repo, &["releases"])?;
        let body = serde_json::to_value(release)?;
        let created: Release = self.send_json(Method::POST, url.as_str(), Some(&body)).await?;

        info!(id = created.id, "created release");
        Ok(created)
    }

    #[instrument(skip(self, release, update), fields(tag = %release.tag_name))]
    async fn update_release(&self, release: &Release, update: &ReleaseUpdate) -> Result<Release> {
        let url = self.release_url(release)?;
        let body = serde_json::to_value(update)?;
        let updated: Release = self.send_json(Method::PATCH, url, Some(&body)).await?;

        info!(new_tag = %updated.tag_name, "updated release");
        Ok(updated)
    }

    #[instrument(skip(self, release), fields(tag = %release.tag_name))]
    async fn delete_release(&self, release: &Release) -> Result<()> {
        let url = self.release_url(release)?;
        self.send_empty(Method::DELETE, url).await?;

        info!("deleted release");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_tag_ref(&self, repo: &str, tag: &str) -> Result<()> {
        let url = self.repo_url(repo, &["git", "refs", "tags", tag])?;
        self.send_empty(Method::DELETE, url.as_str()).await?;

        info!("deleted tag ref");
        Ok(())
    }

    #[instrument(skip(self, release), fields(tag = %release.tag_name))]
    async fn upload_asset(&self, release: &Release, path: &Path) -> Result<Asset> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                ProviderError::Configuration(format!("invalid asset path: {}", path.display()))
            })?;

        let url = Self::upload_target(release, file_name)?;
        let content = tokio::fs::read(path).await?;
        let size = content.len();

        // Uploads are POSTs and are never resent
        let response = self
            .request(Method::POST, url.as_str())
            .header(CONTENT_TYPE, BINARY_MEDIA_TYPE)
            .body(content)
            .send()
            .await?;
        let asset: Asset = ensure_success(response).await?.json().await?;

        info!(name = %asset.name, size, "uploaded asset");
        Ok(asset)
    }

    #[instrument(skip(self, release), fields(tag = %release.tag_name))]
    async fn list_assets(&self, release: &Release) -> Result<Vec<Asset>> {
        let mut assets = Vec::new();
        let base = self.release_url(release)?;
        let mut page = 1;

        loop {
            let url = format!("{}/assets?per_page={}&page={}", base, PAGE_SIZE, page);
            let batch: Vec<Asset> = self.send_json(Method::GET, &url, None).await?;
            let done = batch.len() < PAGE_SIZE;
            assets.extend(batch);
            if done {
                break;
            }
            page += 1;
        }

        Ok(assets)
    }

    #[instrument(skip(self, asset), fields(asset = %asset.name))]
    async fn download_asset(&self, asset: &Asset, dest_dir: &Path) -> Result<PathBuf> {
        let response = send_with_retry(&self.config.retry, &Method::GET, || {
            self.request_accepting(Method::GET, &asset.url, BINARY_MEDIA_TYPE)
        })
        .await?;
        let mut response = ensure_success(response).await?;

        let file_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(content_disposition_filename)
            .or_else(|| {
                asset
                    .url
                    .rsplit('/')
                    .next()
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            })
            .ok_or_else(|| {
                ProviderError::InvalidResponse(format!(
                    "cannot determine file name for asset {}",
                    asset.name
                ))
            })?;

        let path = dest_dir.join(&file_name);
        let mut file = tokio::fs::File::create(&path).await?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        info!(path = %path.display(), bytes = written, "downloaded asset");
        Ok(path)
    }
}
