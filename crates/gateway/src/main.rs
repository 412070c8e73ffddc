//! Offline gateway entry point.
//!
//! Maintenance binary for the cache layer: pre-caches the app shell,
//! purges partitions left over from previous cache versions, then runs
//! a self-check against the warmed store. Logging goes to stderr as
//! structured JSON.

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use tablemate_client::{FetchConfig, Fetcher, Gateway, GatewayRequest, Lifecycle, NetworkClient};
use tablemate_core::{AppConfig, CacheStore};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(version = %config.cache_version, db = %config.db_path.display(), "starting offline gateway maintenance");

    let store = CacheStore::open(&config.db_path).await?;
    let fetcher: Arc<dyn Fetcher> = Arc::new(NetworkClient::new(FetchConfig {
        user_agent: config.user_agent.clone(),
        timeout: config.timeout(),
        ..Default::default()
    })?);

    let mut lifecycle = Lifecycle::new(store.clone(), Arc::clone(&fetcher), config.clone());
    lifecycle.install().await?;
    let purged = lifecycle.activate().await?;

    let static_entries = store.count_entries(&config.static_partition()).await?;
    tracing::info!(purged, static_entries, "cache partitions ready");

    // Self-check: the warmed shell must serve even if the network
    // disappears from here on.
    let gateway = Gateway::new(&config, store, fetcher)?;
    let root = GatewayRequest::document(&config.origin)?;
    match gateway.handle_fetch(&root).await {
        Ok(Some(response)) => {
            tracing::info!(status = response.status, served_from = %response.served_from, "root shell check passed");
        }
        Ok(None) => tracing::warn!("root shell was classified out of scope, check origin configuration"),
        Err(e) => tracing::warn!("root shell check failed: {e}"),
    }

    Ok(())
}
