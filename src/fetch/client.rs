//! HTTP fetcher that reads whole response bodies under a retry policy.
//!
//! This module provides the [`HttpFetcher`] struct used for both listing
//! pages and image downloads. Responses are buffered in full: listing pages
//! are small JSON documents and images top out at a few megabytes, so
//! streaming to disk would buy nothing.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, instrument, warn};
use url::Url;

use super::error::FetchError;
use super::retry::RetryPolicy;
use crate::user_agent;

/// Connection timeout for all requests (seconds).
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Full-response timeout for all requests (seconds).
const READ_TIMEOUT_SECS: u64 = 120;

/// Longest response-body prefix included in debug logs for bad statuses.
const MAX_BODY_SNIPPET_CHARS: usize = 512;

/// HTTP fetcher with a fixed identity and optional bearer credential.
///
/// The fetcher is created once per run and reused for every request, taking
/// advantage of connection pooling. Authenticated listing traffic uses a
/// fetcher built with [`HttpFetcher::with_bearer_token`]; image traffic uses
/// a plain one.
///
/// # Example
///
/// ```no_run
/// use snooharvest_core::fetch::{HttpFetcher, RetryPolicy};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = HttpFetcher::new();
/// let policy = RetryPolicy::bounded(3);
/// let bytes = fetcher.fetch("https://i.redd.it/abc.jpg", &policy).await?;
/// println!("fetched {} bytes", bytes.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    bearer_token: Option<String>,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    /// Creates a fetcher with the default User-Agent and no credential.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::with_user_agent(&user_agent::default_user_agent())
    }

    /// Creates a fetcher with a custom User-Agent and no credential.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_user_agent(user_agent: &str) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .gzip(true)
            .user_agent(user_agent)
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            bearer_token: None,
        }
    }

    /// Creates a fetcher that sends `Authorization: Bearer <token>` on every
    /// request, for the authenticated listing endpoint.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// configuration.
    #[must_use]
    pub fn with_bearer_token(user_agent: &str, token: impl Into<String>) -> Self {
        let mut fetcher = Self::with_user_agent(user_agent);
        fetcher.bearer_token = Some(token.into());
        fetcher
    }

    /// Fetches `url` and returns the full response body.
    ///
    /// HTTP 429 responses are retried per `policy`, sleeping the policy's
    /// backoff delay between tries and logging each wait. Any other
    /// non-success status and any transport error fail immediately.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if:
    /// - The URL is invalid
    /// - The request fails at the network level
    /// - The server returns a non-2xx status other than 429
    /// - The server keeps returning 429 past the policy's attempt budget
    #[instrument(skip(self, policy), fields(url = %url))]
    pub async fn fetch(&self, url: &str, policy: &RetryPolicy) -> Result<Vec<u8>, FetchError> {
        Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;

        let mut attempt: u32 = 0;
        loop {
            let mut request = self.client.get(url);
            if let Some(token) = &self.bearer_token {
                request = request.bearer_auth(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| FetchError::transport(url, e))?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if !policy.should_retry(attempt) {
                    return Err(FetchError::rate_limit_exhausted(url, attempt + 1));
                }
                let delay = policy.backoff_delay(attempt);
                warn!(
                    attempt,
                    delay_ms = delay.as_millis(),
                    "rate limited; backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            if !status.is_success() {
                let status_code = status.as_u16();
                let body = response.text().await.unwrap_or_default();
                debug!(
                    status = status_code,
                    body = body_snippet(&body),
                    "non-success response"
                );
                return Err(FetchError::bad_status(url, status_code));
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| FetchError::transport(url, e))?;
            debug!(bytes = bytes.len(), "fetch complete");
            return Ok(bytes.to_vec());
        }
    }
}

/// Truncates a response body to a loggable prefix on a char boundary.
fn body_snippet(body: &str) -> &str {
    match body.char_indices().nth(MAX_BODY_SNIPPET_CHARS) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
