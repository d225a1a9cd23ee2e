//! Auth command handler: exchange credentials for a bearer token.

use anyhow::{Context, Result};
use snooharvest_core::auth::{Credentials, TokenClient};
use snooharvest_core::user_agent;
use tracing::info;

use crate::cli::AuthArgs;

pub async fn run_auth_command(args: AuthArgs) -> Result<()> {
    let user_agent = args
        .user_agent
        .unwrap_or_else(user_agent::default_user_agent);
    let mut client = TokenClient::with_user_agent(&user_agent);
    if let Some(endpoint) = args.endpoint {
        client = client.with_endpoint(endpoint);
    }

    let credentials = Credentials {
        client_id: args.client_id,
        client_secret: args.client_secret,
        username: args.username,
        password: args.password,
    };

    let token = client
        .exchange(&credentials)
        .await
        .context("token exchange failed")?;
    info!(username = %credentials.username, "token exchange succeeded");

    // The token goes to stdout on its own so shell substitution can capture it.
    println!("{token}");
    Ok(())
}
