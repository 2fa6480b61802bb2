//! GitHub releases integration
//!
//! Implements [`HostingClient`](crate::HostingClient) on top of the GitHub REST
//! API v3. Authentication uses a personal access token.

mod client;
mod disposition;

pub use client::{GitHubClient, GitHubConfig, DEFAULT_API_URL};
pub use disposition::content_disposition_filename;
