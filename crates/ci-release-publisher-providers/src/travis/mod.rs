//! Travis-CI build status integration
//!
//! Implements [`CiStatusClient`](crate::CiStatusClient) against the Travis API
//! v3. Sessions are obtained by exchanging a GitHub token, lazily, on the
//! first query.

mod client;
mod endpoint;

pub use client::{TravisClient, TravisConfig};
pub use endpoint::TravisEndpoint;
