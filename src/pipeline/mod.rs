//! Content-addressed image fetch pipeline.
//!
//! # Overview
//!
//! The pipeline turns an ordered list of candidates into artifacts on disk,
//! one candidate at a time:
//!
//! 1. Hash the URL with [`UrlHash`] and check the [`ArtifactStore`]. A
//!    success or error artifact from any earlier run settles the candidate
//!    without touching the network.
//! 2. Otherwise pace, fetch under the bounded retry policy, normalize the
//!    bytes with [`canonical_jpeg`], and record either the image or the
//!    failure message.
//!
//! Per-item failures (a bad status for one image, undecodable bytes) become
//! durable error artifacts and the run continues; only filesystem failures
//! abort it. Successful fetches are also recorded in the in-memory
//! [`ImageIndex`] the caller passes in, which it writes out after the run.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use snooharvest_core::extract::collect_candidates;
//! use snooharvest_core::fetch::HttpFetcher;
//! use snooharvest_core::listing::PageStore;
//! use snooharvest_core::pipeline::{ArtifactStore, FetchPipeline, ImageIndex};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PageStore::open("listing")?;
//! let candidates = collect_candidates(&store, 512)?;
//!
//! let artifacts = ArtifactStore::open("images")?;
//! let mut index = ImageIndex::load(Path::new("index.json"))?;
//! let mut pipeline = FetchPipeline::new(HttpFetcher::new(), artifacts);
//!
//! let stats = pipeline.run(&candidates, &mut index).await?;
//! index.write(Path::new("index.json"))?;
//! println!("downloaded {} (got {} errors)", stats.downloaded(), stats.errored());
//! # Ok(())
//! # }
//! ```

mod artifacts;
mod encode;
mod index;

pub use artifacts::{ArtifactError, ArtifactState, ArtifactStore, UrlHash};
pub use encode::{EncodeError, JPEG_QUALITY, canonical_jpeg};
pub use index::{ImageIndex, IndexError};

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::extract::ImageCandidate;
use crate::fetch::{
    DEFAULT_IMAGE_FETCH_ATTEMPTS, FetchError, HttpFetcher, RequestPacer, RetryPolicy,
};

/// Default minimum spacing between consecutive image requests.
pub const DEFAULT_REQUEST_SPACING: Duration = Duration::from_secs(1);

/// A failure that settles one candidate without aborting the run.
///
/// The display form is what gets written to the error artifact.
#[derive(Debug, Error)]
pub enum ItemError {
    /// The image could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The fetched bytes could not be normalized.
    #[error(transparent)]
    Decode(#[from] EncodeError),
}

/// Running counts over one pipeline run.
///
/// `downloaded` counts success artifacts whether they were created in this
/// run or found already on disk; `errored` likewise counts error artifacts.
/// The totals therefore describe the corpus state after the run, not just
/// this run's network activity.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    downloaded: usize,
    errored: usize,
}

impl RunStats {
    /// Number of candidates with a success artifact.
    #[must_use]
    pub fn downloaded(&self) -> usize {
        self.downloaded
    }

    /// Number of candidates with an error artifact.
    #[must_use]
    pub fn errored(&self) -> usize {
        self.errored
    }

    /// Number of candidates settled either way.
    #[must_use]
    pub fn total(&self) -> usize {
        self.downloaded + self.errored
    }
}

/// Sequential fetch-normalize-record loop over image candidates.
#[derive(Debug)]
pub struct FetchPipeline {
    fetcher: HttpFetcher,
    policy: RetryPolicy,
    pacer: RequestPacer,
    artifacts: ArtifactStore,
}

impl FetchPipeline {
    /// Creates a pipeline with the default bounded retry policy and the
    /// default one-second request spacing.
    #[must_use]
    pub fn new(fetcher: HttpFetcher, artifacts: ArtifactStore) -> Self {
        Self {
            fetcher,
            policy: RetryPolicy::bounded(DEFAULT_IMAGE_FETCH_ATTEMPTS),
            pacer: RequestPacer::new(DEFAULT_REQUEST_SPACING),
            artifacts,
        }
    }

    /// Replaces the retry policy for image fetches.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces the request pacer.
    #[must_use]
    pub fn with_pacer(mut self, pacer: RequestPacer) -> Self {
        self.pacer = pacer;
        self
    }

    /// Returns the artifact store the pipeline records into.
    #[must_use]
    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    /// Processes `candidates` in order, recording artifacts and filling
    /// `index` with every candidate whose success artifact exists by the
    /// end of the run.
    ///
    /// Candidates already settled on disk are skipped without a network
    /// request; the pacer only spaces actual fetches. Running counts are
    /// logged after each candidate, skips at debug and fetches at info.
    ///
    /// # Errors
    ///
    /// Returns `ArtifactError` if an artifact cannot be written. Per-item
    /// fetch and decode failures are recorded, not returned.
    #[instrument(skip_all, fields(candidates = candidates.len()))]
    pub async fn run(
        &mut self,
        candidates: &[ImageCandidate],
        index: &mut ImageIndex,
    ) -> Result<RunStats, ArtifactError> {
        let mut stats = RunStats::default();

        for candidate in candidates {
            let hash = UrlHash::of(&candidate.url);
            match self.artifacts.state(&hash) {
                ArtifactState::Fetched => {
                    stats.downloaded += 1;
                    index.insert(&hash, candidate.clone());
                    debug!(
                        url = %candidate.url,
                        hash = %hash,
                        downloaded = stats.downloaded,
                        errors = stats.errored,
                        "image already fetched; skipping"
                    );
                    continue;
                }
                ArtifactState::Failed => {
                    stats.errored += 1;
                    debug!(
                        url = %candidate.url,
                        hash = %hash,
                        downloaded = stats.downloaded,
                        errors = stats.errored,
                        "error on record; skipping"
                    );
                    continue;
                }
                ArtifactState::Pending => {}
            }

            self.pacer.pace().await;
            match self.fetch_one(&candidate.url).await {
                Ok(jpeg) => {
                    self.artifacts.record_image(&hash, &jpeg)?;
                    index.insert(&hash, candidate.clone());
                    stats.downloaded += 1;
                    info!(
                        url = %candidate.url,
                        downloaded = stats.downloaded,
                        errors = stats.errored,
                        "image stored"
                    );
                }
                Err(e) => {
                    self.artifacts.record_error(&hash, &e.to_string())?;
                    stats.errored += 1;
                    warn!(
                        url = %candidate.url,
                        error = %e,
                        downloaded = stats.downloaded,
                        errors = stats.errored,
                        "image failed; error recorded"
                    );
                }
            }
        }

        info!(
            downloaded = stats.downloaded,
            errors = stats.errored,
            total = stats.total(),
            "pipeline run complete"
        );
        Ok(stats)
    }

    /// Fetches one URL and normalizes the bytes to the canonical form.
    async fn fetch_one(&self, url: &str) -> Result<Vec<u8>, ItemError> {
        let raw = self.fetcher.fetch(url, &self.policy).await?;
        let jpeg = canonical_jpeg(&raw)?;
        Ok(jpeg)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use std::io::Cursor;

    use image::{ImageFormat, Rgb, RgbImage};
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tiny_png() -> Vec<u8> {
        let img = RgbImage::from_pixel(4, 4, Rgb([200, 80, 10]));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    fn candidate(url: &str) -> ImageCandidate {
        ImageCandidate {
            url: url.to_string(),
            title: "a good dog".to_string(),
            created_utc: 1_700_000_000,
            permalink: "/r/corgi/comments/abc/a_good_dog/".to_string(),
        }
    }

    fn fast_pipeline(artifacts: ArtifactStore) -> FetchPipeline {
        FetchPipeline::new(HttpFetcher::new(), artifacts)
            .with_retry_policy(
                RetryPolicy::bounded(3).with_base_delay(Duration::from_millis(10)),
            )
            .with_pacer(RequestPacer::disabled())
    }

    // ==================== Happy Path Tests ====================

    #[tokio::test]
    async fn test_run_fetches_and_stores_canonical_jpeg() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dog.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(tiny_png()))
            .expect(1)
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let artifacts = ArtifactStore::open(temp_dir.path()).unwrap();
        let mut pipeline = fast_pipeline(artifacts);
        let mut index = ImageIndex::new();

        let url = format!("{}/dog.png", server.uri());
        let stats = pipeline.run(&[candidate(&url)], &mut index).await.unwrap();

        assert_eq!(stats.downloaded(), 1);
        assert_eq!(stats.errored(), 0);

        let hash = UrlHash::of(&url);
        let stored = std::fs::read(pipeline.artifacts().image_path(&hash)).unwrap();
        assert_eq!(image::guess_format(&stored).unwrap(), ImageFormat::Jpeg);
        assert!(index.contains(&hash));
        assert_eq!(index.get(&hash).unwrap().title, "a good dog");
    }

    #[tokio::test]
    async fn test_existing_success_artifact_skips_network() {
        // No mock mounted: any request would fail the fetch and the test.
        let server = MockServer::start().await;
        let url = format!("{}/done.png", server.uri());
        let hash = UrlHash::of(&url);

        let temp_dir = TempDir::new().unwrap();
        let artifacts = ArtifactStore::open(temp_dir.path()).unwrap();
        artifacts.record_image(&hash, b"prior jpeg bytes").unwrap();

        let mut pipeline = fast_pipeline(artifacts);
        let mut index = ImageIndex::new();
        let stats = pipeline.run(&[candidate(&url)], &mut index).await.unwrap();

        assert_eq!(stats.downloaded(), 1);
        assert_eq!(stats.errored(), 0);
        assert!(index.contains(&hash), "skipped successes still reach the index");
        assert_eq!(server.received_requests().await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_existing_error_artifact_skips_and_is_not_retried() {
        let server = MockServer::start().await;
        let url = format!("{}/known-bad.png", server.uri());
        let hash = UrlHash::of(&url);

        let temp_dir = TempDir::new().unwrap();
        let artifacts = ArtifactStore::open(temp_dir.path()).unwrap();
        artifacts.record_error(&hash, "bad HTTP status code 404").unwrap();

        let mut pipeline = fast_pipeline(artifacts);
        let mut index = ImageIndex::new();
        let stats = pipeline.run(&[candidate(&url)], &mut index).await.unwrap();

        assert_eq!(stats.downloaded(), 0);
        assert_eq!(stats.errored(), 1);
        assert!(!index.contains(&hash), "errored candidates stay out of the index");
        assert_eq!(server.received_requests().await.unwrap().len(), 0);
    }

    // ==================== Per-Item Failure Tests ====================

    #[tokio::test]
    async fn test_bad_status_records_error_and_run_continues() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone.png"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/fine.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(tiny_png()))
            .expect(1)
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let artifacts = ArtifactStore::open(temp_dir.path()).unwrap();
        let mut pipeline = fast_pipeline(artifacts);
        let mut index = ImageIndex::new();

        let bad_url = format!("{}/gone.png", server.uri());
        let good_url = format!("{}/fine.png", server.uri());
        let stats = pipeline
            .run(&[candidate(&bad_url), candidate(&good_url)], &mut index)
            .await
            .unwrap();

        assert_eq!(stats.downloaded(), 1);
        assert_eq!(stats.errored(), 1);

        let bad_hash = UrlHash::of(&bad_url);
        let message =
            std::fs::read_to_string(pipeline.artifacts().error_path(&bad_hash)).unwrap();
        assert!(message.contains("404"), "error artifact: {message}");
        assert!(!index.contains(&bad_hash));
        assert!(index.contains(&UrlHash::of(&good_url)));
    }

    #[tokio::test]
    async fn test_undecodable_bytes_record_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/not-an-image.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"<html>soft 404</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let artifacts = ArtifactStore::open(temp_dir.path()).unwrap();
        let mut pipeline = fast_pipeline(artifacts);
        let mut index = ImageIndex::new();

        let url = format!("{}/not-an-image.png", server.uri());
        let stats = pipeline.run(&[candidate(&url)], &mut index).await.unwrap();

        assert_eq!(stats.errored(), 1);
        let message = std::fs::read_to_string(
            pipeline.artifacts().error_path(&UrlHash::of(&url)),
        )
        .unwrap();
        assert!(
            message.contains("cannot decode image"),
            "error artifact: {message}"
        );
    }

    #[tokio::test]
    async fn test_persistent_rate_limit_recorded_after_budget() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/limited.png"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let artifacts = ArtifactStore::open(temp_dir.path()).unwrap();
        let mut pipeline = fast_pipeline(artifacts);
        let mut index = ImageIndex::new();

        let url = format!("{}/limited.png", server.uri());
        let stats = pipeline.run(&[candidate(&url)], &mut index).await.unwrap();

        assert_eq!(stats.errored(), 1);
        let message = std::fs::read_to_string(
            pipeline.artifacts().error_path(&UrlHash::of(&url)),
        )
        .unwrap();
        assert!(
            message.contains("too many rate limit responses"),
            "error artifact: {message}"
        );
    }

    // ==================== Idempotence Tests ====================

    #[tokio::test]
    async fn test_second_run_makes_no_network_calls() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/once.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(tiny_png()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/never.png"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let url_ok = format!("{}/once.png", server.uri());
        let url_bad = format!("{}/never.png", server.uri());
        let candidates = vec![candidate(&url_ok), candidate(&url_bad)];

        let artifacts = ArtifactStore::open(temp_dir.path()).unwrap();
        let mut pipeline = fast_pipeline(artifacts);
        let mut index = ImageIndex::new();
        let first = pipeline.run(&candidates, &mut index).await.unwrap();
        assert_eq!((first.downloaded(), first.errored()), (1, 1));

        // Same candidates, fresh pipeline over the same directory. The mock
        // expectations of one request each would fail on any re-fetch.
        let artifacts = ArtifactStore::open(temp_dir.path()).unwrap();
        let mut pipeline = fast_pipeline(artifacts);
        let mut index = ImageIndex::new();
        let second = pipeline.run(&candidates, &mut index).await.unwrap();

        assert_eq!((second.downloaded(), second.errored()), (1, 1));
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }
}
