//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use snooharvest_core::{DEFAULT_IMAGE_FETCH_ATTEMPTS, DEFAULT_RESOLUTION_FLOOR};

/// Harvest a deduplicated image corpus from subreddit listings.
///
/// Snooharvest crawls a subreddit listing into a directory of page files,
/// then downloads, normalizes, and indexes the images those pages name.
/// Both passes are resumable: re-running only does the work that is still
/// missing.
#[derive(Parser, Debug)]
#[command(name = "snooharvest")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Crawl a subreddit listing into a directory of page files
    Crawl(CrawlArgs),
    /// Download, normalize, and index the images named by crawled pages
    Fetch(FetchArgs),
    /// Exchange account credentials for a bearer token
    Auth(AuthArgs),
}

/// Which listing endpoint to crawl.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceArg {
    /// Live listing endpoint (token cursor; needs --access-token)
    Reddit,
    /// Archive search endpoint (timestamp cursor; no credential)
    Archive,
}

/// Arguments for the `crawl` subcommand.
#[derive(clap::Args, Debug)]
pub struct CrawlArgs {
    /// Subreddit to crawl (bare name, no "r/" prefix)
    pub subreddit: String,

    /// Listing source to page through
    #[arg(long, value_enum, default_value_t = SourceArg::Reddit)]
    pub source: SourceArg,

    /// Directory the page files are written to
    #[arg(long, default_value = "listing")]
    pub listing_dir: PathBuf,

    /// Bearer token for the live listing endpoint (see the auth subcommand)
    #[arg(long)]
    pub access_token: Option<String>,

    /// Override the User-Agent sent with every request
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Override the listing endpoint base URL (mirrors, tests)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Seconds to wait between listing pages (0-600)
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(0..=600))]
    pub page_delay: u64,

    /// Start a new crawl instead of resuming; the listing directory must be empty
    #[arg(long)]
    pub fresh: bool,
}

/// Arguments for the `fetch` subcommand.
#[derive(clap::Args, Debug)]
pub struct FetchArgs {
    /// Directory the page files are read from
    #[arg(long, default_value = "listing")]
    pub listing_dir: PathBuf,

    /// Directory the image and error artifacts are written to
    #[arg(long, default_value = "images")]
    pub output_dir: PathBuf,

    /// Path of the index file
    #[arg(long, default_value = "index.json")]
    pub index: PathBuf,

    /// Smallest acceptable image dimension; preview variants must exceed it (0-8192)
    #[arg(long, default_value_t = DEFAULT_RESOLUTION_FLOOR, value_parser = clap::value_parser!(u32).range(0..=8192))]
    pub min_resolution: u32,

    /// Minimum delay between image requests in milliseconds (0 to disable, max 60000)
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub request_spacing: u64,

    /// Attempts per image before a rate-limited fetch is recorded as failed (1-10)
    #[arg(long, default_value_t = DEFAULT_IMAGE_FETCH_ATTEMPTS, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub max_attempts: u32,

    /// Rebuild the index from this run only instead of merging into an existing one
    #[arg(long)]
    pub fresh_index: bool,
}

/// Arguments for the `auth` subcommand.
#[derive(clap::Args, Debug)]
pub struct AuthArgs {
    /// OAuth client id of the registered script app
    #[arg(long)]
    pub client_id: String,

    /// OAuth client secret of the registered script app
    #[arg(long)]
    pub client_secret: String,

    /// Account username
    #[arg(long)]
    pub username: String,

    /// Account password
    #[arg(long)]
    pub password: String,

    /// Override the User-Agent sent with the token request
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Override the token endpoint URL (tests)
    #[arg(long)]
    pub endpoint: Option<String>,
}
