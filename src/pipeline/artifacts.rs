//! Content-addressed artifacts for fetched images.
//!
//! Every candidate URL maps to exactly one artifact name: the MD5 of the
//! UTF-8 URL string, in lowercase hex. A fetched image lands at
//! `<hex>.jpg`, a failed fetch at `<hex>_error.txt`, and the presence of
//! either file is what makes repeated runs skip completed work. MD5 is a
//! naming scheme here, not a security boundary; it keeps artifact names
//! compatible with corpora downloaded by earlier versions of the tooling.
//!
//! Writes land in a `.tmp` sibling first and are renamed into place, so a
//! killed process leaves no partially written artifact behind.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use md5::{Digest, Md5};
use thiserror::Error;
use tracing::debug;

/// Errors raised by the artifact store.
///
/// Artifact writes only fail when the filesystem itself does, which is
/// fatal to the whole run rather than to one item.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// File system operation failed.
    #[error("IO error on {path}: {source}")]
    Io {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl ArtifactError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Stable content-address of one candidate URL.
///
/// The hash is computed over the URL string, not the image bytes, so the
/// skip check works before any download happens.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UrlHash(String);

impl UrlHash {
    /// Hashes a URL to its artifact key.
    #[must_use]
    pub fn of(url: &str) -> Self {
        let mut hasher = Md5::new();
        hasher.update(url.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Returns the 32-char lowercase hex form.
    #[must_use]
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UrlHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Terminal state of one URL's artifact pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactState {
    /// A success artifact exists; the URL is done.
    Fetched,
    /// An error artifact exists; the failure is on record and is not
    /// retried across runs. Deleting the file is the manual retry path.
    Failed,
    /// Neither artifact exists yet.
    Pending,
}

/// Directory of content-addressed image and error artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Opens the store at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `ArtifactError::Io` if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, ArtifactError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| ArtifactError::io(&dir, e))?;
        Ok(Self { dir })
    }

    /// Returns the store directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the success artifact path for `hash`.
    #[must_use]
    pub fn image_path(&self, hash: &UrlHash) -> PathBuf {
        self.dir.join(format!("{hash}.jpg"))
    }

    /// Returns the error artifact path for `hash`.
    #[must_use]
    pub fn error_path(&self, hash: &UrlHash) -> PathBuf {
        self.dir.join(format!("{hash}_error.txt"))
    }

    /// Reports which terminal state `hash` has reached, if any.
    ///
    /// A success artifact wins over a stray error artifact; the two should
    /// never coexist, but if they do, the image on disk is the truth.
    #[must_use]
    pub fn state(&self, hash: &UrlHash) -> ArtifactState {
        if self.image_path(hash).is_file() {
            ArtifactState::Fetched
        } else if self.error_path(hash).is_file() {
            ArtifactState::Failed
        } else {
            ArtifactState::Pending
        }
    }

    /// Records `bytes` as the success artifact for `hash`.
    ///
    /// The write goes to a `.tmp` sibling and is renamed into place.
    ///
    /// # Errors
    ///
    /// Returns `ArtifactError::Io` if writing or renaming fails.
    pub fn record_image(&self, hash: &UrlHash, bytes: &[u8]) -> Result<PathBuf, ArtifactError> {
        let final_path = self.image_path(hash);
        let tmp_path = final_path.with_extension("jpg.tmp");
        fs::write(&tmp_path, bytes).map_err(|e| ArtifactError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &final_path).map_err(|e| ArtifactError::io(&final_path, e))?;
        debug!(
            path = %final_path.display(),
            bytes = bytes.len(),
            "recorded image artifact"
        );
        Ok(final_path)
    }

    /// Records `message` as the error artifact for `hash`.
    ///
    /// # Errors
    ///
    /// Returns `ArtifactError::Io` if writing or renaming fails.
    pub fn record_error(&self, hash: &UrlHash, message: &str) -> Result<PathBuf, ArtifactError> {
        let final_path = self.error_path(hash);
        let tmp_path = final_path.with_extension("txt.tmp");
        fs::write(&tmp_path, message.as_bytes()).map_err(|e| ArtifactError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &final_path).map_err(|e| ArtifactError::io(&final_path, e))?;
        debug!(path = %final_path.display(), "recorded error artifact");
        Ok(final_path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    // ==================== UrlHash Tests ====================

    #[test]
    fn test_url_hash_matches_known_md5_vectors() {
        assert_eq!(UrlHash::of("").as_hex(), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(
            UrlHash::of("abc").as_hex(),
            "900150983cd24fb0d6963f7d28e17f72"
        );
        assert_eq!(
            UrlHash::of("The quick brown fox jumps over the lazy dog").as_hex(),
            "9e107d9d372bb6826bd81d3542a419d6"
        );
    }

    #[test]
    fn test_url_hash_is_deterministic() {
        let url = "https://i.redd.it/abc.jpg";
        assert_eq!(UrlHash::of(url), UrlHash::of(url));
        assert_eq!(UrlHash::of(url).as_hex(), UrlHash::of(url).as_hex());
    }

    #[test]
    fn test_url_hash_shape() {
        let hash = UrlHash::of("https://i.redd.it/abc.jpg");
        assert_eq!(hash.as_hex().len(), 32);
        assert!(hash.as_hex().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash.as_hex(), hash.as_hex().to_lowercase());
    }

    #[test]
    fn test_distinct_urls_hash_differently() {
        let urls = [
            "https://i.redd.it/a.jpg",
            "https://i.redd.it/b.jpg",
            "https://i.redd.it/a.jpg?x=1",
            "https://preview.redd.it/a.jpg",
        ];
        for (i, a) in urls.iter().enumerate() {
            for b in &urls[i + 1..] {
                assert_ne!(UrlHash::of(a), UrlHash::of(b), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn test_url_hash_display_matches_hex() {
        let hash = UrlHash::of("abc");
        assert_eq!(hash.to_string(), hash.as_hex());
    }

    // ==================== Path Tests ====================

    #[test]
    fn test_artifact_paths_follow_naming_scheme() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(temp_dir.path()).unwrap();
        let hash = UrlHash::of("abc");

        assert_eq!(
            store.image_path(&hash).file_name().unwrap(),
            "900150983cd24fb0d6963f7d28e17f72.jpg"
        );
        assert_eq!(
            store.error_path(&hash).file_name().unwrap(),
            "900150983cd24fb0d6963f7d28e17f72_error.txt"
        );
    }

    #[test]
    fn test_open_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("images");
        assert!(!dir.exists());

        let _store = ArtifactStore::open(&dir).unwrap();
        assert!(dir.is_dir());
    }

    // ==================== State Tests ====================

    #[test]
    fn test_state_pending_before_any_record() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(temp_dir.path()).unwrap();
        let hash = UrlHash::of("https://i.redd.it/new.jpg");

        assert_eq!(store.state(&hash), ArtifactState::Pending);
    }

    #[test]
    fn test_state_fetched_after_image_record() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(temp_dir.path()).unwrap();
        let hash = UrlHash::of("https://i.redd.it/done.jpg");

        store.record_image(&hash, b"jpeg bytes").unwrap();
        assert_eq!(store.state(&hash), ArtifactState::Fetched);
    }

    #[test]
    fn test_state_failed_after_error_record() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(temp_dir.path()).unwrap();
        let hash = UrlHash::of("https://i.redd.it/bad.jpg");

        store.record_error(&hash, "bad HTTP status code 404").unwrap();
        assert_eq!(store.state(&hash), ArtifactState::Failed);
    }

    #[test]
    fn test_state_image_wins_over_stray_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(temp_dir.path()).unwrap();
        let hash = UrlHash::of("https://i.redd.it/both.jpg");

        store.record_error(&hash, "transient failure").unwrap();
        store.record_image(&hash, b"jpeg bytes").unwrap();
        assert_eq!(store.state(&hash), ArtifactState::Fetched);
    }

    // ==================== Write Tests ====================

    #[test]
    fn test_record_image_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(temp_dir.path()).unwrap();
        let hash = UrlHash::of("https://i.redd.it/tmp.jpg");

        store.record_image(&hash, b"jpeg bytes").unwrap();

        let names: Vec<String> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with(".jpg"), "unexpected file: {names:?}");
    }

    #[test]
    fn test_record_error_stores_message_text() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(temp_dir.path()).unwrap();
        let hash = UrlHash::of("https://i.redd.it/msg.jpg");

        let path = store
            .record_error(&hash, "bad HTTP status code 403 fetching thing")
            .unwrap();
        let stored = fs::read_to_string(path).unwrap();
        assert_eq!(stored, "bad HTTP status code 403 fetching thing");
    }

    #[test]
    fn test_record_image_stores_exact_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(temp_dir.path()).unwrap();
        let hash = UrlHash::of("https://i.redd.it/exact.jpg");

        let bytes: Vec<u8> = (0..=255).collect();
        let path = store.record_image(&hash, &bytes).unwrap();
        assert_eq!(fs::read(path).unwrap(), bytes);
    }
}
