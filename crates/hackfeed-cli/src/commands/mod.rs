use std::sync::Arc;

use anyhow::{Context, Result};
use hackfeed_core::NewsClient;
use hackfeed_infrastructure::{ClientConfig, FileSessionStore, HttpRemoteService};

pub mod render;
pub mod session;
pub mod stories;

/// Wires the HTTP remote and the file store into a client.
pub fn build_client(config: &ClientConfig) -> Result<NewsClient> {
    let remote = HttpRemoteService::from_config(config).context("Failed to set up the API client")?;
    let store_path = config
        .resolved_store_path()
        .context("Failed to locate the session file")?;
    tracing::debug!(api = %remote.base_url(), store = %store_path.display(), "Client configured");

    Ok(NewsClient::new(
        Arc::new(remote),
        Arc::new(FileSessionStore::new(store_path)),
    ))
}

/// Restores the stored session and fetches stories.
///
/// A failed fetch is not fatal here: commands that only need the session
/// still work offline.
pub async fn start(client: &NewsClient) {
    if let Err(e) = client.start().await {
        tracing::warn!(error = %e, "Starting without a story list");
    }
}
