//! Retry budgets and exponential backoff for rate-limited responses.
//!
//! Only HTTP 429 is ever retried; every other failure is surfaced to the
//! caller on the first occurrence. The [`RetryPolicy`] decides how many 429s
//! to tolerate and how long to wait between tries.
//!
//! # Overview
//!
//! Two budgets are used in practice:
//! - [`RetryPolicy::bounded`] with [`DEFAULT_IMAGE_FETCH_ATTEMPTS`] for image
//!   downloads, where giving up on one URL is cheap (the failure is recorded
//!   and the run continues);
//! - [`RetryPolicy::unbounded`] for listing pages, where giving up would abort
//!   the whole crawl and the server's limit always clears eventually.
//!
//! Backoff doubles per attempt with no jitter: the process is single-threaded
//! and sends one request at a time, so there is no herd to spread out.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use snooharvest_core::fetch::RetryPolicy;
//!
//! let policy = RetryPolicy::bounded(3);
//! assert_eq!(policy.backoff_delay(0), Duration::from_secs(1));
//! assert_eq!(policy.backoff_delay(1), Duration::from_secs(2));
//! assert!(policy.should_retry(0));
//! assert!(!policy.should_retry(2));
//! ```

use std::time::Duration;

/// Default number of requests sent for one image before giving up.
pub const DEFAULT_IMAGE_FETCH_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff (1 second).
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Delay cap so an unbounded policy cannot shift itself into overflow (64 seconds).
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(64);

/// Retry budget and backoff schedule for 429 responses.
///
/// Attempts are 0-indexed request numbers: attempt 0 is the first request,
/// and `backoff_delay(n)` is the wait applied after attempt `n` fails.
///
/// # Delay Calculation
///
/// ```text
/// delay = min(base_delay * 2^attempt, max_delay)
/// ```
///
/// With the default 1 second base, delays are 1s, 2s, 4s, 8s, ...
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of requests (including the initial attempt).
    /// `None` means retry forever.
    max_attempts: Option<u32>,

    /// Delay after the first failed attempt.
    base_delay: Duration,

    /// Cap applied to every computed delay.
    max_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy that allows at most `max_attempts` requests.
    ///
    /// A value of 0 is clamped to 1 (the initial request always happens).
    #[must_use]
    pub fn bounded(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts.max(1)),
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }

    /// Creates a policy that retries 429 responses indefinitely.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            max_attempts: None,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }

    /// Replaces the base delay, keeping the rest of the schedule.
    ///
    /// Tests shrink the base to milliseconds so backoff paths run fast.
    #[must_use]
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Returns the configured attempt limit, if any.
    #[must_use]
    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    /// Returns whether another request may be sent after attempt `attempt` failed.
    #[must_use]
    pub fn should_retry(&self, attempt: u32) -> bool {
        match self.max_attempts {
            Some(max) => attempt + 1 < max,
            None => true,
        }
    }

    /// Calculates the backoff delay applied after attempt `attempt` fails.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}
