//! Durable store for crawled listing pages.
//!
//! Pages are persisted as the verbatim response bytes under zero-padded
//! sequence-numbered filenames (`00000.json`, `00001.json`, ...). The
//! sequence number is the ordering key and is always parsed back out of the
//! filename stem as an integer; directory listing order is never trusted.
//!
//! Writes land in a `.tmp` sibling first and are renamed into place, so a
//! killed process leaves no partially written page behind.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Errors raised by the page store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// File system operation failed.
    #[error("IO error on {path}: {source}")]
    Io {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A persisted page exists but cannot be interpreted.
    #[error("corrupt listing page {path}: {detail}")]
    Corrupt {
        /// The unreadable page file.
        path: PathBuf,
        /// What failed while interpreting it.
        detail: String,
    },
}

impl StoreError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a corrupt-page error.
    pub fn corrupt(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.into(),
            detail: detail.into(),
        }
    }
}

/// A page file on disk, identified by its parsed sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPage {
    /// Sequence number parsed from the filename stem.
    pub seq: u64,
    /// Full path to the page file.
    pub path: PathBuf,
}

impl StoredPage {
    /// Reads the page's verbatim bytes.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the file cannot be read.
    pub fn read(&self) -> Result<Vec<u8>, StoreError> {
        fs::read(&self.path).map_err(|e| StoreError::io(&self.path, e))
    }
}

/// Directory of sequence-numbered listing page files.
#[derive(Debug, Clone)]
pub struct PageStore {
    dir: PathBuf,
}

impl PageStore {
    /// Opens the store at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        Ok(Self { dir })
    }

    /// Returns the store directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the path for the page with sequence number `seq`.
    #[must_use]
    pub fn page_path(&self, seq: u64) -> PathBuf {
        self.dir.join(format!("{seq:05}.json"))
    }

    /// Persists `bytes` as page `seq`, replacing any existing page file.
    ///
    /// The write goes to a `.tmp` sibling and is renamed into place.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if writing or renaming fails.
    pub fn persist(&self, seq: u64, bytes: &[u8]) -> Result<PathBuf, StoreError> {
        let final_path = self.page_path(seq);
        let tmp_path = final_path.with_extension("json.tmp");
        fs::write(&tmp_path, bytes).map_err(|e| StoreError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &final_path).map_err(|e| StoreError::io(&final_path, e))?;
        debug!(
            path = %final_path.display(),
            bytes = bytes.len(),
            "persisted listing page"
        );
        Ok(final_path)
    }

    /// Enumerates persisted pages sorted by sequence number.
    ///
    /// Dotfiles, non-`.json` entries, and files whose stem is not an
    /// integer are skipped.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the directory cannot be read.
    pub fn pages(&self) -> Result<Vec<StoredPage>, StoreError> {
        let mut pages = Vec::new();
        let entries = fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.dir, e))?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            let Some(stem) = name.strip_suffix(".json") else {
                continue;
            };
            let Ok(seq) = stem.parse::<u64>() else {
                debug!(name, "skipping non-sequence file in listing directory");
                continue;
            };
            pages.push(StoredPage {
                seq,
                path: entry.path(),
            });
        }
        pages.sort_by_key(|page| page.seq);
        Ok(pages)
    }

    /// Returns whether the store holds no pages.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the directory cannot be read.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.pages()?.is_empty())
    }

    /// Returns the page with the highest sequence number, if any.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the directory cannot be read.
    pub fn last_page(&self) -> Result<Option<StoredPage>, StoreError> {
        Ok(self.pages()?.into_iter().next_back())
    }

    /// Returns the sequence number the next persisted page should use.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the directory cannot be read.
    pub fn next_seq(&self) -> Result<u64, StoreError> {
        Ok(self.last_page()?.map_or(0, |page| page.seq + 1))
    }
}
