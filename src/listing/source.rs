//! Listing sources and their cursor schemes.
//!
//! A [`ListingSource`] knows how to address one subreddit's submission
//! listing on a concrete endpoint, and how to derive the next [`Cursor`]
//! from a parsed page. Two kinds exist:
//! - [`SourceKind::Reddit`]: the authenticated endpoint, paged by an opaque
//!   `after` token the server returns with each page;
//! - [`SourceKind::Archive`]: the archive endpoint, paged by a `before`
//!   timestamp taken from the last entry of the previous page.
//!
//! The endpoint base is overridable so mirrors of the archive API (and test
//! servers) can stand in for the defaults.

use url::Url;

use super::model::ListingDocument;

/// Default authenticated listing endpoint.
pub const DEFAULT_REDDIT_ENDPOINT: &str = "https://oauth.reddit.com";

/// Default archive endpoint.
pub const DEFAULT_ARCHIVE_ENDPOINT: &str = "https://api.pushshift.io";

/// Entries requested per page from the authenticated endpoint.
const REDDIT_PAGE_LIMIT: u32 = 100;

/// Entries requested per page from the archive endpoint.
const ARCHIVE_PAGE_SIZE: u32 = 500;

/// Which listing API a crawl walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Authenticated token-cursor listing.
    Reddit,
    /// Archive timestamp-cursor listing.
    Archive,
}

/// Position within a paginated result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cursor {
    /// Opaque continuation token, sent as the `after` query parameter.
    After(String),
    /// Timestamp upper bound in epoch seconds, sent as `before`.
    Before(i64),
}

/// One subreddit's listing on a concrete endpoint.
#[derive(Debug, Clone)]
pub struct ListingSource {
    kind: SourceKind,
    subreddit: String,
    /// Fully addressed page URL without any cursor parameter.
    page_base: Url,
}

impl ListingSource {
    /// Creates a source for the default authenticated endpoint.
    ///
    /// # Panics
    ///
    /// Panics if the compiled-in default endpoint fails to parse. This
    /// should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn reddit(subreddit: &str) -> Self {
        let endpoint =
            Url::parse(DEFAULT_REDDIT_ENDPOINT).expect("default listing endpoint is valid");
        Self::reddit_at(&endpoint, subreddit)
    }

    /// Creates a source for the authenticated listing shape on a custom
    /// endpoint base.
    #[must_use]
    pub fn reddit_at(endpoint: &Url, subreddit: &str) -> Self {
        let mut page_base = endpoint.clone();
        if let Ok(mut segments) = page_base.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["r", subreddit, "new.json"]);
        }
        page_base
            .query_pairs_mut()
            .append_pair("limit", &REDDIT_PAGE_LIMIT.to_string());
        Self {
            kind: SourceKind::Reddit,
            subreddit: subreddit.to_string(),
            page_base,
        }
    }

    /// Creates a source for the default archive endpoint.
    ///
    /// # Panics
    ///
    /// Panics if the compiled-in default endpoint fails to parse. This
    /// should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn archive(subreddit: &str) -> Self {
        let endpoint =
            Url::parse(DEFAULT_ARCHIVE_ENDPOINT).expect("default archive endpoint is valid");
        Self::archive_at(&endpoint, subreddit)
    }

    /// Creates a source for the archive listing shape on a custom endpoint
    /// base, such as a mirror.
    #[must_use]
    pub fn archive_at(endpoint: &Url, subreddit: &str) -> Self {
        let mut page_base = endpoint.clone();
        if let Ok(mut segments) = page_base.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["reddit", "search", "submission", ""]);
        }
        page_base
            .query_pairs_mut()
            .append_pair("subreddit", subreddit)
            .append_pair("size", &ARCHIVE_PAGE_SIZE.to_string());
        Self {
            kind: SourceKind::Archive,
            subreddit: subreddit.to_string(),
            page_base,
        }
    }

    /// Returns which listing API this source walks.
    #[must_use]
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Returns the subreddit this source lists.
    #[must_use]
    pub fn subreddit(&self) -> &str {
        &self.subreddit
    }

    /// Builds the request URL for the page at `cursor`, or the first page
    /// when no cursor is held.
    #[must_use]
    pub fn page_url(&self, cursor: Option<&Cursor>) -> Url {
        let mut url = self.page_base.clone();
        match cursor {
            None => {}
            Some(Cursor::After(token)) => {
                url.query_pairs_mut().append_pair("after", token);
            }
            Some(Cursor::Before(timestamp)) => {
                url.query_pairs_mut()
                    .append_pair("before", &timestamp.to_string());
            }
        }
        url
    }

    /// Derives the cursor for the page after `document`, if the response
    /// carries one.
    #[must_use]
    pub fn next_cursor(&self, document: &ListingDocument) -> Option<Cursor> {
        match self.kind {
            SourceKind::Reddit => document
                .continuation_token()
                .map(|token| Cursor::After(token.to_string())),
            SourceKind::Archive => document.last_created_utc().map(Cursor::Before),
        }
    }
}
