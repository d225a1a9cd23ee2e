//! Hash-keyed metadata index over successfully fetched images.
//!
//! The index maps each success artifact's URL hash to the candidate
//! metadata it was fetched from, so downstream consumers can find title,
//! permalink, and creation time without re-reading listing pages. Keys are
//! kept sorted, making the serialized file deterministic for a given set of
//! records.
//!
//! Loading an existing index and overlaying the current run's records is
//! how resumed runs keep entries for work completed earlier.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::extract::ImageCandidate;

use super::artifacts::UrlHash;

/// Errors raised while loading or writing the index file.
#[derive(Debug, Error)]
pub enum IndexError {
    /// File system operation failed.
    #[error("IO error on {path}: {source}")]
    Io {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// An existing index file could not be parsed.
    #[error("corrupt index {path}: {detail}")]
    Corrupt {
        /// The unreadable index file.
        path: PathBuf,
        /// What failed while parsing it.
        detail: String,
    },
}

impl IndexError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a corrupt-index error.
    pub fn corrupt(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.into(),
            detail: detail.into(),
        }
    }
}

/// Sorted mapping from URL hash to fetched-image metadata.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageIndex {
    entries: BTreeMap<String, ImageCandidate>,
}

impl ImageIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the index at `path`, or an empty index if no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Io` if an existing file cannot be read, or
    /// `IndexError::Corrupt` if it does not parse as an index.
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no existing index; starting empty");
                return Ok(Self::new());
            }
            Err(e) => return Err(IndexError::io(path, e)),
        };
        let index: Self =
            serde_json::from_slice(&bytes).map_err(|e| IndexError::corrupt(path, e.to_string()))?;
        debug!(
            path = %path.display(),
            entries = index.len(),
            "loaded existing index"
        );
        Ok(index)
    }

    /// Records `candidate` under `hash`, replacing any prior record.
    pub fn insert(&mut self, hash: &UrlHash, candidate: ImageCandidate) {
        self.entries.insert(hash.as_hex().to_string(), candidate);
    }

    /// Looks up the record for `hash`.
    #[must_use]
    pub fn get(&self, hash: &UrlHash) -> Option<&ImageCandidate> {
        self.entries.get(hash.as_hex())
    }

    /// Returns whether `hash` has a record.
    #[must_use]
    pub fn contains(&self, hash: &UrlHash) -> bool {
        self.entries.contains_key(hash.as_hex())
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the index holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the index to `path` as a single JSON object with sorted keys.
    ///
    /// The write goes to a `.tmp` sibling and is renamed into place.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Io` if writing or renaming fails.
    pub fn write(&self, path: &Path) -> Result<(), IndexError> {
        let bytes = serde_json::to_vec(self)
            .map_err(|e| IndexError::corrupt(path, format!("serialization failed: {e}")))?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, &bytes).map_err(|e| IndexError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, path).map_err(|e| IndexError::io(path, e))?;
        debug!(
            path = %path.display(),
            entries = self.len(),
            "wrote index"
        );
        Ok(())
    }
}
