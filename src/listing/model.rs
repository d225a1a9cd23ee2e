//! Data model for listing pages.
//!
//! Two upstream page shapes exist and both must parse:
//! - the authenticated listing endpoint wraps entries in
//!   `{"data": {"after": .., "children": [{"kind": .., "data": {..}}]}}`;
//! - the archive endpoint returns a flat `{"data": [{..}]}`.
//!
//! [`ListingDocument`] is an untagged union over the two; the shapes are
//! distinguished by whether `data` is an object or an array.

use serde::{Deserialize, Deserializer};

/// A parsed listing page in either upstream shape.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListingDocument {
    /// Token-cursor shape from the authenticated listing endpoint.
    Reddit(RedditListing),
    /// Timestamp-cursor shape from the archive endpoint.
    Archive(ArchiveListing),
}

/// Token-cursor listing wrapper.
#[derive(Debug, Deserialize)]
pub struct RedditListing {
    pub data: RedditListingData,
}

/// Inner payload of the token-cursor shape.
#[derive(Debug, Deserialize)]
pub struct RedditListingData {
    /// Continuation token for the next page. Null or absent on the last page.
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub children: Vec<RedditChild>,
}

/// One `children` element; the `kind` discriminator is not needed.
#[derive(Debug, Deserialize)]
pub struct RedditChild {
    pub data: Entry,
}

/// Timestamp-cursor listing wrapper.
#[derive(Debug, Deserialize)]
pub struct ArchiveListing {
    #[serde(default)]
    pub data: Vec<Entry>,
}

/// One submission entry, common to both shapes.
#[derive(Debug, Clone, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub title: String,

    /// Direct asset URL as submitted. Used as a fallback candidate when
    /// the entry carries no preview set.
    #[serde(default)]
    pub url: String,

    /// Visibility flag. `false` marks entries removed by moderation; an
    /// absent flag is treated the same way. Neither yields candidates.
    #[serde(rename = "is_robot_indexable", default)]
    pub indexable: bool,

    /// Creation time in epoch seconds. The authenticated endpoint serializes
    /// this as a float, the archive endpoint as an integer; both parse.
    #[serde(rename = "created_utc", default, deserialize_with = "epoch_seconds")]
    pub created_utc: i64,

    #[serde(default)]
    pub permalink: String,

    pub preview: Option<Preview>,
}

/// Preview image set attached to an entry.
#[derive(Debug, Clone, Deserialize)]
pub struct Preview {
    #[serde(default)]
    pub images: Vec<PreviewImage>,
}

/// One preview image: a full-fidelity source plus downscaled resolutions.
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewImage {
    pub source: Option<PreviewVariant>,
    /// Downscaled variants. `null` (as opposed to an empty list) marks
    /// preview data the API withheld; such images are skipped entirely.
    pub resolutions: Option<Vec<PreviewVariant>>,
}

/// A single sized rendition of a preview image.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PreviewVariant {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

impl ListingDocument {
    /// Parses a raw listing page body in either shape.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json::Error` if the bytes match neither shape.
    pub fn parse(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Returns the entries of the page in listing order.
    #[must_use]
    pub fn entries(&self) -> Vec<&Entry> {
        match self {
            Self::Reddit(listing) => listing
                .data
                .children
                .iter()
                .map(|child| &child.data)
                .collect(),
            Self::Archive(listing) => listing.data.iter().collect(),
        }
    }

    /// Number of entries on the page.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        match self {
            Self::Reddit(listing) => listing.data.children.len(),
            Self::Archive(listing) => listing.data.len(),
        }
    }

    /// Returns whether the page carries no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }

    /// Continuation token for the token-cursor shape.
    ///
    /// Returns `None` for the archive shape and when the token is null or
    /// empty, which is how the endpoint signals the final page.
    #[must_use]
    pub fn continuation_token(&self) -> Option<&str> {
        match self {
            Self::Reddit(listing) => listing
                .data
                .after
                .as_deref()
                .filter(|token| !token.is_empty()),
            Self::Archive(_) => None,
        }
    }

    /// Creation time of the last entry, the cursor for the archive shape.
    #[must_use]
    pub fn last_created_utc(&self) -> Option<i64> {
        match self {
            Self::Reddit(listing) => listing
                .data
                .children
                .last()
                .map(|child| child.data.created_utc),
            Self::Archive(listing) => listing.data.last().map(|entry| entry.created_utc),
        }
    }
}

/// Accepts integer or float epoch seconds, truncating fractions.
#[allow(clippy::cast_possible_truncation)]
fn epoch_seconds<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = f64::deserialize(deserializer)?;
    Ok(seconds as i64)
}
