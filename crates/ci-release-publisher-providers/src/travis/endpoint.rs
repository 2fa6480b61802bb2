use serde::{Deserialize, Serialize};

const PUBLIC_WEB_URL: &str = "https://travis-ci.org";
const PUBLIC_API_URL: &str = "https://api.travis-ci.org";
const PRIVATE_WEB_URL: &str = "https://travis-ci.com";
const PRIVATE_API_URL: &str = "https://api.travis-ci.com";

/// Which Travis-CI installation to talk to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravisEndpoint {
    /// travis-ci.org
    #[default]
    Public,
    /// travis-ci.com
    Private,
    /// Self-hosted installation at the given web URL
    Enterprise(String),
}

impl TravisEndpoint {
    /// Root of the web UI, used for build and job links
    pub fn web_url(&self) -> String {
        match self {
            Self::Public => PUBLIC_WEB_URL.to_string(),
            Self::Private => PRIVATE_WEB_URL.to_string(),
            Self::Enterprise(url) => url.trim_end_matches('/').to_string(),
        }
    }

    /// Root of the API
    pub fn api_url(&self) -> String {
        match self {
            Self::Public => PUBLIC_API_URL.to_string(),
            Self::Private => PRIVATE_API_URL.to_string(),
            Self::Enterprise(url) => format!("{}/api", url.trim_end_matches('/')),
        }
    }

    /// Link to a build page
    pub fn build_url(&self, repo_slug: &str, build_id: &str) -> String {
        format!("{}/{}/builds/{}", self.web_url(), repo_slug, build_id)
    }

    /// Link to a job page
    pub fn job_url(&self, repo_slug: &str, job_id: &str) -> String {
        format!("{}/{}/jobs/{}", self.web_url(), repo_slug, job_id)
    }
}
