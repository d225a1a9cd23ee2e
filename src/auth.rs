//! Reddit OAuth2 password-grant token exchange.
//!
//! # Overview
//!
//! The authenticated listing endpoint wants a short-lived bearer token. A
//! script app obtains one by POSTing its account credentials to the token
//! endpoint with HTTP basic auth carrying the app's client id and secret.
//! [`TokenClient::exchange`] performs that POST and extracts the
//! `access_token` field; refresh and expiry handling are left to the caller
//! (tokens last long enough for a crawl, and re-running `auth` is cheap).
//!
//! # Example
//!
//! ```no_run
//! use snooharvest_core::auth::{Credentials, TokenClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = Credentials {
//!     client_id: "app-id".to_string(),
//!     client_secret: "app-secret".to_string(),
//!     username: "reader".to_string(),
//!     password: "hunter2".to_string(),
//! };
//! let token = TokenClient::new().exchange(&credentials).await?;
//! println!("{token}");
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::user_agent;

/// Default Reddit token endpoint.
const DEFAULT_TOKEN_ENDPOINT: &str = "https://www.reddit.com/api/v1/access_token";

/// Connection timeout for the token request (seconds).
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Full-response timeout for the token request (seconds).
const READ_TIMEOUT_SECS: u64 = 60;

/// Script-app credentials for the password grant.
#[derive(Clone)]
pub struct Credentials {
    /// OAuth client id of the registered script app.
    pub client_id: String,
    /// OAuth client secret of the registered script app.
    pub client_secret: String,
    /// Account username.
    pub username: String,
    /// Account password.
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Errors from the token exchange.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Network-level error reaching the token endpoint.
    #[error("token request to {endpoint} failed: {source}")]
    Transport {
        /// The endpoint that could not be reached.
        endpoint: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The token endpoint returned a non-2xx status (401 means the client
    /// id/secret pair is wrong).
    #[error("token endpoint {endpoint} returned bad HTTP status code {status}")]
    BadStatus {
        /// The endpoint that answered.
        endpoint: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The endpoint answered 200 but refused the grant. Reddit reports bad
    /// account credentials this way, as `{"error": "invalid_grant"}`.
    #[error("token endpoint {endpoint} rejected the credentials: {reason}")]
    Rejected {
        /// The endpoint that answered.
        endpoint: String,
        /// The `error` field of the response.
        reason: String,
    },

    /// The response body was not the expected token JSON.
    #[error("unexpected token response from {endpoint}: {detail}")]
    Malformed {
        /// The endpoint that answered.
        endpoint: String,
        /// What was wrong with the body.
        detail: String,
    },
}

impl AuthError {
    /// Creates a transport error from a reqwest error.
    pub fn transport(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn bad_status(endpoint: impl Into<String>, status: u16) -> Self {
        Self::BadStatus {
            endpoint: endpoint.into(),
            status,
        }
    }

    /// Creates a rejected-grant error.
    pub fn rejected(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Creates a malformed-response error.
    pub fn malformed(endpoint: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Malformed {
            endpoint: endpoint.into(),
            detail: detail.into(),
        }
    }
}

/// Relevant fields of the token endpoint response.
///
/// Reddit answers a refused grant with HTTP 200 and an `error` field instead
/// of a token, so both fields are optional and checked explicitly.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

/// Client for the password-grant token exchange.
#[derive(Debug, Clone)]
pub struct TokenClient {
    client: Client,
    endpoint: String,
}

impl Default for TokenClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenClient {
    /// Creates a token client with the default User-Agent and endpoint.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::with_user_agent(&user_agent::default_user_agent())
    }

    /// Creates a token client with a custom User-Agent.
    ///
    /// Reddit throttles unidentified clients aggressively, so the User-Agent
    /// sent here should match the one the crawl will use.
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
            .user_agent(user_agent)
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            endpoint: DEFAULT_TOKEN_ENDPOINT.to_string(),
        }
    }

    /// Replaces the token endpoint (for mirrors and tests).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Exchanges credentials for a bearer token.
    ///
    /// Sends `grant_type=password` with the account credentials as a
    /// form-urlencoded body, authenticated with HTTP basic auth over the
    /// app's client id and secret, and returns the `access_token` field of
    /// the response.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if:
    /// - The request fails at the network level
    /// - The endpoint returns a non-2xx status
    /// - The endpoint refuses the grant (`{"error": ..}` body)
    /// - The response body is not the expected token JSON
    #[instrument(skip_all, fields(endpoint = %self.endpoint, username = %credentials.username))]
    pub async fn exchange(&self, credentials: &Credentials) -> Result<String, AuthError> {
        let form = [
            ("grant_type", "password"),
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
        ];

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::transport(&self.endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::bad_status(&self.endpoint, status.as_u16()));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::malformed(&self.endpoint, e.to_string()))?;

        if let Some(reason) = body.error {
            return Err(AuthError::rejected(&self.endpoint, reason));
        }

        match body.access_token {
            Some(token) if !token.is_empty() => {
                debug!("token exchange succeeded");
                Ok(token)
            }
            _ => Err(AuthError::malformed(
                &self.endpoint,
                "response carried no access_token",
            )),
        }
    }
}
