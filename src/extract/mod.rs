//! Candidate extraction over persisted listing pages.
//!
//! # Overview
//!
//! Extraction is a pure pass over the page store: every persisted page is
//! parsed, every entry is run through the selection policy in
//! [`select_candidate`], and the surviving URLs are sorted and
//! de-duplicated. The result is deterministic for a given store, whatever
//! order the pages were crawled in, so the fetch pipeline's hash-keyed
//! skip checks line up across runs.

mod candidate;

pub use candidate::{select_candidate, ImageCandidate, DEFAULT_RESOLUTION_FLOOR};

use tracing::debug;

use crate::listing::{ListingDocument, PageStore, StoreError};

/// Collects candidates from every page in `store`, sorted by URL with
/// duplicates removed (first occurrence kept).
///
/// # Errors
///
/// Returns `StoreError::Io` if the store cannot be read, or
/// `StoreError::Corrupt` if a persisted page does not parse.
pub fn collect_candidates(
    store: &PageStore,
    floor: u32,
) -> Result<Vec<ImageCandidate>, StoreError> {
    let mut candidates = Vec::new();
    for page in store.pages()? {
        let raw = page.read()?;
        let document = ListingDocument::parse(&raw)
            .map_err(|e| StoreError::corrupt(&page.path, e.to_string()))?;
        let before = candidates.len();
        candidates.extend(
            document
                .entries()
                .into_iter()
                .filter_map(|entry| select_candidate(entry, floor)),
        );
        debug!(
            seq = page.seq,
            entries = document.entry_count(),
            candidates = candidates.len() - before,
            "extracted candidates from page"
        );
    }

    candidates.sort_by(|a, b| a.url.cmp(&b.url));
    candidates.dedup_by(|a, b| a.url == b.url);
    Ok(candidates)
}
