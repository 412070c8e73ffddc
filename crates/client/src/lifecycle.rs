//! Cache partition lifecycle: install, activate, purge.
//!
//! Install pre-populates the static partition with the app shell;
//! activation deletes every partition left over from previous versions
//! and takes over immediately. Version bumps are the only mechanism
//! for invalidating durable cache contents.

use std::sync::Arc;

use url::Url;

use crate::fetch::{Destination, Fetcher, GatewayRequest};
use tablemate_core::{AppConfig, CacheStore, Error};

/// Lifecycle progression of one gateway version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Installing,
    Installed,
    Activating,
    Active,
}

/// Owns partition setup and teardown for the current cache version.
pub struct Lifecycle {
    store: CacheStore,
    fetcher: Arc<dyn Fetcher>,
    config: AppConfig,
    state: LifecycleState,
}

impl Lifecycle {
    pub fn new(store: CacheStore, fetcher: Arc<dyn Fetcher>, config: AppConfig) -> Self {
        Self { store, fetcher, config, state: LifecycleState::Installing }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Pre-cache the app shell into the static partition.
    ///
    /// Every route in the manifest must fetch with an ok status; a
    /// single failure fails the whole install, leaving the previous
    /// version's partitions untouched. Readiness is immediate — there
    /// is no waiting on a prior instance to wind down.
    pub async fn install(&mut self) -> Result<(), Error> {
        self.state = LifecycleState::Installing;
        let partition = self.config.static_partition();
        self.store.open_partition(&partition).await?;

        let origin = Url::parse(&self.config.origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        for route in &self.config.precache_routes {
            let url = origin.join(route).map_err(|e| Error::InvalidUrl(e.to_string()))?;
            let destination = if route.rsplit('/').next().is_some_and(|seg| seg.contains('.')) {
                Destination::Other
            } else {
                Destination::Document
            };
            let req = GatewayRequest { method: "GET".to_string(), url, destination };

            let response = self.fetcher.fetch(&req).await?;
            if !response.is_ok() {
                return Err(Error::Http(format!("pre-cache of {route} returned status {}", response.status)));
            }
            self.store.upsert_entry(&partition, &response.to_cached(&req)).await?;
        }

        self.state = LifecycleState::Installed;
        tracing::info!(partition, routes = self.config.precache_routes.len(), "static shell pre-cached");
        Ok(())
    }

    /// Purge partitions from previous versions and take over.
    ///
    /// Returns the number of partitions deleted. The static, dynamic
    /// and legacy names for the current version survive; everything
    /// else goes.
    pub async fn activate(&mut self) -> Result<u64, Error> {
        self.state = LifecycleState::Activating;
        let live = self.config.live_partitions();

        let mut purged = 0;
        for name in self.store.list_partitions().await? {
            if !live.contains(&name) {
                purged += self.store.delete_partition(&name).await?;
                tracing::info!(partition = %name, "purged stale cache partition");
            }
        }

        self.store.open_partition(&self.config.dynamic_partition()).await?;

        self.state = LifecycleState::Active;
        tracing::info!(version = %self.config.cache_version, purged, "gateway version active");
        Ok(purged)
    }
}
