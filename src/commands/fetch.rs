//! Fetch command handler: download, normalize, and index candidate images.

use std::time::Duration;

use anyhow::{Context, Result};
use snooharvest_core::extract::collect_candidates;
use snooharvest_core::fetch::{HttpFetcher, RequestPacer, RetryPolicy};
use snooharvest_core::listing::PageStore;
use snooharvest_core::pipeline::{ArtifactStore, FetchPipeline, ImageIndex};
use tracing::info;

use crate::cli::FetchArgs;

pub async fn run_fetch_command(args: FetchArgs) -> Result<()> {
    let store = PageStore::open(&args.listing_dir).with_context(|| {
        format!(
            "cannot open listing directory {}",
            args.listing_dir.display()
        )
    })?;
    let candidates = collect_candidates(&store, args.min_resolution)?;
    info!(candidates = candidates.len(), "extracted image candidates");

    let artifacts = ArtifactStore::open(&args.output_dir).with_context(|| {
        format!("cannot open output directory {}", args.output_dir.display())
    })?;
    let mut index = if args.fresh_index {
        ImageIndex::new()
    } else {
        ImageIndex::load(&args.index)
            .with_context(|| format!("cannot read index {}", args.index.display()))?
    };

    let pacer = if args.request_spacing == 0 {
        RequestPacer::disabled()
    } else {
        RequestPacer::new(Duration::from_millis(args.request_spacing))
    };
    let mut pipeline = FetchPipeline::new(HttpFetcher::new(), artifacts)
        .with_retry_policy(RetryPolicy::bounded(args.max_attempts))
        .with_pacer(pacer);

    let stats = pipeline.run(&candidates, &mut index).await?;
    index
        .write(&args.index)
        .with_context(|| format!("cannot write index {}", args.index.display()))?;

    info!(
        downloaded = stats.downloaded(),
        errors = stats.errored(),
        indexed = index.len(),
        index = %args.index.display(),
        "fetch complete"
    );
    Ok(())
}
