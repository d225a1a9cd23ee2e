//! Minimum spacing between consecutive HTTP requests.
//!
//! The listing API's informal budget is expressed as "no more than one
//! request per second", measured between request *starts*. [`RequestPacer`]
//! enforces that: the stamp is taken when a request begins, so time spent
//! downloading and transcoding counts toward the next request's wait.
//!
//! The process is sequential, so the pacer is a plain mutable value rather
//! than shared state.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use snooharvest_core::fetch::RequestPacer;
//!
//! # async fn example() {
//! let mut pacer = RequestPacer::new(Duration::from_secs(1));
//!
//! // First request proceeds immediately.
//! pacer.pace().await;
//! // ... fetch ...
//!
//! // Second request waits out the remainder of the 1 second window.
//! pacer.pace().await;
//! # }
//! ```

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Enforces a minimum interval between consecutive request starts.
#[derive(Debug)]
pub struct RequestPacer {
    /// Minimum time between request starts.
    interval: Duration,

    /// When the previous request started. `None` before the first request.
    last_request: Option<Instant>,
}

impl RequestPacer {
    /// Creates a pacer with the given minimum interval between requests.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_request: None,
        }
    }

    /// Creates a pacer that applies no delay.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Returns the configured minimum interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits until the minimum interval since the previous request start has
    /// passed, then marks the next request as started.
    ///
    /// The first call returns immediately.
    pub async fn pace(&mut self) {
        if let Some(last_request) = self.last_request {
            let elapsed = last_request.elapsed();
            if elapsed < self.interval {
                let delay = self.interval.saturating_sub(elapsed);
                debug!(delay_ms = delay.as_millis(), "pacing before next request");
                tokio::time::sleep(delay).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}
