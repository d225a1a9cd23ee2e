//! Error types for the fetch module.
//!
//! This module defines structured errors for HTTP fetch operations,
//! providing context-rich error messages for logging and error artifacts.

use thiserror::Error;

/// Errors that can occur while fetching a URL.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Transport {
        /// The URL that failed to fetch.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// HTTP error response other than 429 (4xx client errors, 5xx server errors).
    ///
    /// These are not retried: for a single image the failure is recorded as an
    /// error artifact, and for a listing page it aborts the crawl.
    #[error("bad HTTP status code {status} fetching {url}")]
    BadStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The server kept responding 429 until the retry budget ran out.
    #[error("too many rate limit responses fetching {url} ({attempts} attempts)")]
    RateLimitExhausted {
        /// The URL that kept being rate limited.
        url: String,
        /// How many requests were sent before giving up.
        attempts: u32,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },
}

impl FetchError {
    /// Creates a transport error from a reqwest error.
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn bad_status(url: impl Into<String>, status: u16) -> Self {
        Self::BadStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a rate-limit exhaustion error.
    pub fn rate_limit_exhausted(url: impl Into<String>, attempts: u32) -> Self {
        Self::RateLimitExhausted {
            url: url.into(),
            attempts,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }
}

// Note on From trait implementations:
// We intentionally do NOT implement `From<reqwest::Error>` because the variants
// require context (the URL) that the source error does not reliably provide.
// The helper constructors are the pattern callers should use.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_bad_status_display() {
        let error = FetchError::bad_status("https://example.com/a.jpg", 404);
        let msg = error.to_string();
        assert!(msg.contains("404"), "Expected '404' in: {msg}");
        assert!(
            msg.contains("https://example.com/a.jpg"),
            "Expected URL in: {msg}"
        );
        assert!(
            msg.contains("bad HTTP status code"),
            "Expected status wording in: {msg}"
        );
    }

    #[test]
    fn test_fetch_error_rate_limit_exhausted_display() {
        let error = FetchError::rate_limit_exhausted("https://example.com/b.jpg", 3);
        let msg = error.to_string();
        assert!(
            msg.contains("too many rate limit responses"),
            "Expected rate limit wording in: {msg}"
        );
        assert!(msg.contains("3 attempts"), "Expected attempt count in: {msg}");
    }

    #[test]
    fn test_fetch_error_invalid_url_display() {
        let error = FetchError::invalid_url("not-a-url");
        let msg = error.to_string();
        assert!(
            msg.contains("invalid URL"),
            "Expected 'invalid URL' in: {msg}"
        );
        assert!(msg.contains("not-a-url"), "Expected URL in: {msg}");
    }
}
