//! Crawl command handler: walk a listing source and persist its pages.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use snooharvest_core::fetch::HttpFetcher;
use snooharvest_core::listing::{CrawlStep, ListingCrawler, ListingSource, PageStore};
use snooharvest_core::user_agent;
use tracing::{debug, info};
use url::Url;

use crate::cli::{CrawlArgs, SourceArg};

pub async fn run_crawl_command(args: CrawlArgs) -> Result<()> {
    if args.source == SourceArg::Reddit && args.access_token.is_none() {
        bail!("the reddit source needs --access-token (run the auth subcommand to get one)");
    }

    let store = PageStore::open(&args.listing_dir).with_context(|| {
        format!(
            "cannot open listing directory {}",
            args.listing_dir.display()
        )
    })?;
    if args.fresh && !store.is_empty()? {
        bail!(
            "--fresh requires an empty listing directory, but {} already holds pages",
            args.listing_dir.display()
        );
    }

    let user_agent = args
        .user_agent
        .clone()
        .unwrap_or_else(user_agent::default_user_agent);
    let fetcher = match &args.access_token {
        Some(token) => HttpFetcher::with_bearer_token(&user_agent, token),
        None => HttpFetcher::with_user_agent(&user_agent),
    };

    let source = build_source(&args)?;
    info!(
        subreddit = %args.subreddit,
        listing_dir = %args.listing_dir.display(),
        "starting crawl"
    );

    let mut crawler = ListingCrawler::resume(source, fetcher, &store)?;
    let page_delay = Duration::from_secs(args.page_delay);

    let mut seq = store.next_seq()?;
    let mut pages: u64 = 0;
    let mut records: usize = 0;
    loop {
        match crawler.next_page().await? {
            CrawlStep::Page(page) => {
                let path = store.persist(seq, &page.raw)?;
                pages += 1;
                records += page.document.entry_count();
                info!(
                    path = %path.display(),
                    entries = page.document.entry_count(),
                    records,
                    "persisted listing page"
                );
                seq += 1;
                if !crawler.is_exhausted() && !page_delay.is_zero() {
                    debug!(delay_s = args.page_delay, "waiting before next page");
                    tokio::time::sleep(page_delay).await;
                }
            }
            CrawlStep::Exhausted => break,
        }
    }

    info!(pages, records, "crawl complete");
    Ok(())
}

/// Builds the listing source from the subcommand flags, honoring an
/// endpoint override.
fn build_source(args: &CrawlArgs) -> Result<ListingSource> {
    let source = match &args.endpoint {
        Some(raw) => {
            let endpoint =
                Url::parse(raw).with_context(|| format!("invalid --endpoint value '{raw}'"))?;
            match args.source {
                SourceArg::Reddit => ListingSource::reddit_at(&endpoint, &args.subreddit),
                SourceArg::Archive => ListingSource::archive_at(&endpoint, &args.subreddit),
            }
        }
        None => match args.source {
            SourceArg::Reddit => ListingSource::reddit(&args.subreddit),
            SourceArg::Archive => ListingSource::archive(&args.subreddit),
        },
    };
    Ok(source)
}
