//! Shared HTTP plumbing: retry with exponential backoff and status checks

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

use crate::error::{ProviderError, Result};

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("ci-release-publisher/", env!("CARGO_PKG_VERSION"));

const RETRYABLE_STATUSES: [StatusCode; 4] = [
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// Transport retry settings shared by all provider clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    /// Base delay, doubled after every failed attempt
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// A policy that sends each request exactly once
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff.saturating_mul(factor)
    }

    fn attempts_for(&self, method: &Method) -> u32 {
        if is_idempotent(method) {
            self.max_attempts.max(1)
        } else {
            1
        }
    }
}

/// Whether a request with this method may be resent safely
pub fn is_idempotent(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::PUT | Method::DELETE | Method::OPTIONS
    )
}

/// Whether a response status is worth retrying
pub fn is_retryable_status(status: StatusCode) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// Send a request, retrying transient failures for idempotent methods
///
/// `build` is called once per attempt since a `RequestBuilder` is consumed on send.
pub async fn send_with_retry<F>(
    policy: &RetryPolicy,
    method: &Method,
    mut build: F,
) -> Result<Response>
where
    F: FnMut() -> RequestBuilder,
{
    let max_attempts = policy.attempts_for(method);
    let mut attempt = 1;

    loop {
        match build().send().await {
            Ok(response) if attempt < max_attempts && is_retryable_status(response.status()) => {
                warn!(
                    status = response.status().as_u16(),
                    url = %response.url(),
                    attempt,
                    max_attempts,
                    "transient server error, retrying"
                );
            }
            Ok(response) => return Ok(response),
            Err(e) if attempt < max_attempts && (e.is_connect() || e.is_timeout()) => {
                warn!(error = %e, attempt, max_attempts, "request failed, retrying");
            }
            Err(e) => return Err(ProviderError::Http(e)),
        }

        let delay = policy.delay_after(attempt);
        debug!(delay_ms = delay.as_millis() as u64, "backing off");
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

/// Turn a non-success response into an API error carrying the body text
pub async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_default();
    Err(ProviderError::Api {
        status: status.as_u16(),
        message: error_text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.backoff, Duration::from_millis(100));
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(200));
        assert_eq!(policy.delay_after(4), Duration::from_millis(800));
    }

    #[test]
    fn test_only_idempotent_methods_retry() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts_for(&Method::GET), 5);
        assert_eq!(policy.attempts_for(&Method::DELETE), 5);
        assert_eq!(policy.attempts_for(&Method::POST), 1);
        assert_eq!(policy.attempts_for(&Method::PATCH), 1);
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(is_retryable_status(StatusCode::GATEWAY_TIMEOUT));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
    }

    #[tokio::test]
    async fn test_get_retries_then_succeeds() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("GET", "/thing")
            .with_status(503)
            .expect(2)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/thing", server.url());
        let policy = RetryPolicy::new(2, Duration::from_millis(1));

        let response = send_with_retry(&policy, &Method::GET, || client.get(&url))
            .await
            .unwrap();

        // Attempts exhausted: the last 503 is handed back to the caller
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        failing.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_is_sent_once() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/thing")
            .with_status(502)
            .expect(1)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/thing", server.url());
        let policy = RetryPolicy::new(5, Duration::from_millis(1));

        let response = send_with_retry(&policy, &Method::POST, || client.post(&url))
            .await
            .unwrap();
        let err = ensure_success(response).await.unwrap_err();

        assert_eq!(err.status(), Some(502));
        mock.assert_async().await;
    }
}
