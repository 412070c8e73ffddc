//! Network-first serving for API and data requests.
//!
//! Freshness is prioritized: the dynamic partition is purely a
//! fallback and is never consulted when the network succeeds.

use std::sync::Arc;

use crate::fetch::{Fetcher, GatewayRequest, GatewayResponse};
use tablemate_core::{CacheStore, Error};

/// Network-first strategy over the dynamic partition.
#[derive(Clone)]
pub struct NetworkFirst {
    store: CacheStore,
    fetcher: Arc<dyn Fetcher>,
    partition: String,
}

impl NetworkFirst {
    pub fn new(store: CacheStore, fetcher: Arc<dyn Fetcher>, partition: String) -> Self {
        Self { store, fetcher, partition }
    }

    /// Serve a request, preferring the live network.
    ///
    /// Ok responses are snapshotted into the dynamic partition before
    /// being returned. Non-ok responses are returned live and uncached,
    /// handling left to the caller. On transport failure the cached
    /// copy is served if one exists, otherwise [`Error::Offline`].
    pub async fn serve(&self, req: &GatewayRequest) -> Result<GatewayResponse, Error> {
        match self.fetcher.fetch(req).await {
            Ok(response) => {
                if response.is_ok() {
                    self.store.upsert_entry(&self.partition, &response.to_cached(req)).await?;
                }
                Ok(response)
            }
            Err(err) => {
                tracing::debug!("network failed for {}, trying cache: {}", req.url, err);
                match self.store.match_request(&self.partition, &req.method, req.url.as_str()).await? {
                    Some(entry) => Ok(GatewayResponse::from_cached(entry)),
                    None => Err(Error::Offline(req.url.to_string())),
                }
            }
        }
    }
}
