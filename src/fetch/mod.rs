//! Rate-limited HTTP fetching.
//!
//! This module provides the single-request building block the crawler and
//! the image pipeline share: fetch one URL, buffer the whole body, retry
//! only on HTTP 429, and surface everything else as a structured error.
//!
//! # Features
//!
//! - Exponential backoff on 429 with bounded or unbounded budgets
//! - Immediate failure on transport errors and other non-2xx statuses
//! - Minimum request spacing anchored at request start
//! - Fixed tool User-Agent, optional bearer credential
//!
//! # Example
//!
//! ```no_run
//! use snooharvest_core::fetch::{HttpFetcher, RetryPolicy};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = HttpFetcher::new();
//! let bytes = fetcher
//!     .fetch("https://i.redd.it/abc.jpg", &RetryPolicy::bounded(3))
//!     .await?;
//! println!("fetched {} bytes", bytes.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod pacer;
mod retry;

pub use client::HttpFetcher;
pub use error::FetchError;
pub use pacer::RequestPacer;
pub use retry::{DEFAULT_IMAGE_FETCH_ATTEMPTS, RetryPolicy};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, FetchError>` explicitly in function signatures.
