//! Subreddit listing crawl: sources, page models, storage, and the crawler.
//!
//! # Overview
//!
//! This module covers everything between "a subreddit name" and "a
//! directory of listing pages on disk":
//!
//! - [`ListingSource`] describes where pages come from (the live listing
//!   endpoint or the archive search endpoint) and how their cursors work.
//! - [`ListingDocument`] parses either response shape and exposes the
//!   entries and continuation data.
//! - [`PageStore`] persists verbatim page bytes under sequence-numbered
//!   filenames and enumerates them back in order.
//! - [`ListingCrawler`] walks the listing cursor by cursor, and can resume
//!   from whatever the store already holds.
//!
//! # Example
//!
//! ```no_run
//! use snooharvest_core::fetch::HttpFetcher;
//! use snooharvest_core::listing::{CrawlStep, ListingCrawler, ListingSource, PageStore};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PageStore::open("listing")?;
//! let source = ListingSource::reddit("corgi");
//! let mut crawler = ListingCrawler::resume(source, HttpFetcher::new(), &store)?;
//!
//! let mut seq = store.next_seq()?;
//! loop {
//!     match crawler.next_page().await? {
//!         CrawlStep::Page(page) => {
//!             store.persist(seq, &page.raw)?;
//!             seq += 1;
//!         }
//!         CrawlStep::Exhausted => break,
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod crawler;
mod model;
mod source;
mod store;

pub use crawler::{CrawlError, CrawlStep, CrawledPage, ListingCrawler};
pub use model::{Entry, ListingDocument, Preview, PreviewImage, PreviewVariant};
pub use source::{
    Cursor, ListingSource, SourceKind, DEFAULT_ARCHIVE_ENDPOINT, DEFAULT_REDDIT_ENDPOINT,
};
pub use store::{PageStore, StoreError, StoredPage};

// Note: we do NOT define module-local Result aliases here. Call sites spell
// out their error types so readers can see exactly what can fail.
