//! CLI command handlers.

mod auth;
mod crawl;
mod fetch;

pub use auth::run_auth_command;
pub use crawl::run_crawl_command;
pub use fetch::run_fetch_command;
