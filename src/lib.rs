//! Snooharvest Core Library
//!
//! This library provides the core functionality for the snooharvest tool,
//! which harvests a deduplicated, canonically-encoded image corpus from
//! subreddit listings and keeps it resumable across runs: pages, images,
//! and per-URL outcomes all live on disk, so a re-run only does the work
//! that is still missing.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`fetch`] - Rate-limited HTTP fetching with 429 backoff
//! - [`listing`] - Listing sources, page parsing, page store, and the crawler
//! - [`extract`] - Image candidate selection over persisted pages
//! - [`pipeline`] - Content-addressed image download, encoding, and indexing
//! - [`auth`] - OAuth2 password-grant token exchange
//!
//! The crawler and the image pipeline are separate passes that share only
//! the filesystem: `crawl` fills a listing directory, `fetch` reads it.

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod extract;
pub mod fetch;
pub mod listing;
pub mod pipeline;
pub mod user_agent;

// Re-export commonly used types
pub use auth::{AuthError, Credentials, TokenClient};
pub use extract::{
    DEFAULT_RESOLUTION_FLOOR, ImageCandidate, collect_candidates, select_candidate,
};
pub use fetch::{
    DEFAULT_IMAGE_FETCH_ATTEMPTS, FetchError, HttpFetcher, RequestPacer, RetryPolicy,
};
pub use listing::{
    CrawlError, CrawlStep, Cursor, ListingCrawler, ListingDocument, ListingSource, PageStore,
    SourceKind, StoreError,
};
pub use pipeline::{
    ArtifactError, ArtifactState, ArtifactStore, FetchPipeline, ImageIndex, IndexError, RunStats,
    UrlHash,
};
