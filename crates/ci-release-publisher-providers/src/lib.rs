//! Hosting and CI provider clients for ci-release-publisher
//!
//! This crate defines the two capability interfaces the release lifecycle is
//! built on, plus the HTTP clients implementing them.
//!
//! ## Providers
//!
//! - **GitHub**: release CRUD, asset upload and download, tag ref deletion
//! - **Travis-CI**: branch build numbers, unfinished builds, failing jobs
//!
//! ## Usage
//!
//! ```ignore
//! use ci_release_publisher_providers::{github::{GitHubClient, GitHubConfig}, HostingClient};
//!
//! let github = GitHubClient::new(GitHubConfig::new(token))?;
//! let releases = github.list_releases("owner/repo").await?;
//! ```

pub mod error;
pub mod http;
pub mod traits;
pub mod types;

pub mod github;
pub mod travis;

pub use error::ProviderError;
pub use http::RetryPolicy;
pub use traits::{CiStatusClient, HostingClient};
pub use types::*;

pub use github::{GitHubClient, GitHubConfig};
pub use travis::{TravisClient, TravisConfig, TravisEndpoint};
