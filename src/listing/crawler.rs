//! Cursor-driven crawl over a subreddit listing source.
//!
//! # Overview
//!
//! [`ListingCrawler`] is an explicit iterator over listing pages. Each call
//! to [`ListingCrawler::next_page`] fetches the page at the current cursor,
//! advances the cursor from the response, and hands the page back to the
//! caller. The crawler never persists anything itself; the caller decides
//! where pages go and how long to wait between them.
//!
//! The crawl ends only when a source reports no further content: a page
//! with zero entries, or a consumed page that carried no continuation
//! token. Both surface as [`CrawlStep::Exhausted`]. Fetch failures are
//! returned as errors and leave the cursor where it was.
//!
//! A crawl can be reconstructed from previously persisted pages with
//! [`ListingCrawler::resume`], which re-derives the cursor from the last
//! page on disk instead of starting over.

use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::fetch::{FetchError, HttpFetcher, RetryPolicy};
use crate::listing::model::ListingDocument;
use crate::listing::source::{Cursor, ListingSource};
use crate::listing::store::{PageStore, StoreError};

/// Errors raised while crawling a listing source.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The listing request failed.
    #[error("listing fetch failed: {source}")]
    Fetch {
        /// The underlying fetch error.
        #[source]
        source: FetchError,
    },

    /// The listing response was not parseable as a known listing shape.
    #[error("malformed listing response from {url}: {source}")]
    Malformed {
        /// The URL that returned the malformed body.
        url: String,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

impl CrawlError {
    /// Creates a fetch error.
    #[must_use]
    pub fn fetch(source: FetchError) -> Self {
        Self::Fetch { source }
    }

    /// Creates a malformed-response error.
    pub fn malformed(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Malformed {
            url: url.into(),
            source,
        }
    }
}

/// One step of the crawl.
#[derive(Debug)]
pub enum CrawlStep {
    /// A page with at least one entry.
    Page(CrawledPage),
    /// The source has no further content.
    Exhausted,
}

/// A fetched listing page, both verbatim and parsed.
#[derive(Debug)]
pub struct CrawledPage {
    /// The response body exactly as received.
    pub raw: Vec<u8>,
    /// The parsed listing document.
    pub document: ListingDocument,
}

/// Stateful iterator over the pages of a listing source.
#[derive(Debug)]
pub struct ListingCrawler {
    source: ListingSource,
    fetcher: HttpFetcher,
    policy: RetryPolicy,
    cursor: Option<Cursor>,
    exhausted: bool,
}

impl ListingCrawler {
    /// Creates a crawler positioned at the start of the listing.
    ///
    /// Listing fetches retry rate limit responses indefinitely; a listing
    /// endpoint that keeps answering 429 is waited out, not abandoned.
    #[must_use]
    pub fn new(source: ListingSource, fetcher: HttpFetcher) -> Self {
        Self {
            source,
            fetcher,
            policy: RetryPolicy::unbounded(),
            cursor: None,
            exhausted: false,
        }
    }

    /// Replaces the retry policy used for listing fetches.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Creates a crawler positioned after the last page persisted in `store`.
    ///
    /// With an empty store this is identical to [`ListingCrawler::new`].
    /// Otherwise the cursor is re-derived from the last persisted page; if
    /// that page carried no continuation, the crawl was already complete
    /// and the first [`ListingCrawler::next_page`] call reports
    /// [`CrawlStep::Exhausted`] without touching the network.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the store cannot be read, or
    /// `StoreError::Corrupt` if the last persisted page does not parse.
    pub fn resume(
        source: ListingSource,
        fetcher: HttpFetcher,
        store: &PageStore,
    ) -> Result<Self, StoreError> {
        let mut crawler = Self::new(source, fetcher);
        let Some(page) = store.last_page()? else {
            return Ok(crawler);
        };

        let raw = page.read()?;
        let document = ListingDocument::parse(&raw)
            .map_err(|e| StoreError::corrupt(&page.path, e.to_string()))?;

        match crawler.source.next_cursor(&document) {
            Some(cursor) => {
                info!(
                    seq = page.seq,
                    cursor = ?cursor,
                    "resuming crawl after last persisted page"
                );
                crawler.cursor = Some(cursor);
            }
            None => {
                info!(
                    seq = page.seq,
                    "last persisted page was terminal; nothing left to crawl"
                );
                crawler.exhausted = true;
            }
        }
        Ok(crawler)
    }

    /// Returns the listing source being crawled.
    #[must_use]
    pub fn source(&self) -> &ListingSource {
        &self.source
    }

    /// Returns the current cursor, if the crawl is mid-listing.
    #[must_use]
    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    /// Returns whether the crawl has reached the end of the listing.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Fetches the page at the current cursor and advances past it.
    ///
    /// Returns [`CrawlStep::Exhausted`] once the source has no further
    /// content: either this fetch produced a page with zero entries (which
    /// is discarded), or an earlier page carried no continuation token.
    /// Exhaustion is sticky; every later call short-circuits.
    ///
    /// # Errors
    ///
    /// Returns `CrawlError::Fetch` if the request fails and
    /// `CrawlError::Malformed` if the response body is not a listing. The
    /// cursor is left unchanged, so the call can be retried.
    #[instrument(skip(self), fields(subreddit = %self.source.subreddit()))]
    pub async fn next_page(&mut self) -> Result<CrawlStep, CrawlError> {
        if self.exhausted {
            return Ok(CrawlStep::Exhausted);
        }

        let url = self.source.page_url(self.cursor.as_ref());
        let raw = self
            .fetcher
            .fetch(url.as_str(), &self.policy)
            .await
            .map_err(CrawlError::fetch)?;
        let document =
            ListingDocument::parse(&raw).map_err(|e| CrawlError::malformed(url.as_str(), e))?;

        if document.is_empty() {
            debug!("listing page has no entries; crawl exhausted");
            self.exhausted = true;
            return Ok(CrawlStep::Exhausted);
        }

        match self.source.next_cursor(&document) {
            Some(cursor) => {
                debug!(cursor = ?cursor, "advancing listing cursor");
                self.cursor = Some(cursor);
            }
            None => {
                // The page is still returned; the crawl ends after it.
                debug!("listing page carried no continuation token");
                self.exhausted = true;
            }
        }

        Ok(CrawlStep::Page(CrawledPage { raw, document }))
    }
}
