//! Gateway composition root.
//!
//! Wires the selector and the three strategies over one store and one
//! fetcher. The host hands every intercepted request to
//! [`Gateway::handle_fetch`]; `None` means the request is out of scope
//! and the host performs its default fetch untouched.

use std::sync::Arc;

use url::Url;

use crate::fetch::{Fetcher, GatewayRequest, GatewayResponse};
use crate::strategy::{BoundedNetworkFirst, CacheFirst, NetworkFirst, RevalidateHook, Route, StrategySelector};
use tablemate_core::{AppConfig, CacheStore, Error};

/// The offline gateway: one entry point per intercepted request.
pub struct Gateway {
    selector: StrategySelector,
    cache_first: CacheFirst,
    network_first: NetworkFirst,
    bounded: BoundedNetworkFirst,
}

impl Gateway {
    /// Build a gateway from configuration, a store and a fetcher.
    pub fn new(config: &AppConfig, store: CacheStore, fetcher: Arc<dyn Fetcher>) -> Result<Self, Error> {
        let selector = StrategySelector::from_config(config)?;
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let cache_first = CacheFirst::new(
            store.clone(),
            Arc::clone(&fetcher),
            config.static_partition(),
            &origin,
        );
        let network_first = NetworkFirst::new(store.clone(), fetcher, config.dynamic_partition());
        let bounded = BoundedNetworkFirst::new(
            network_first.clone(),
            store,
            config.dynamic_partition(),
            config.nav_timeout(),
        );

        Ok(Self { selector, cache_first, network_first, bounded })
    }

    /// Attach a diagnostic hook for background revalidation failures.
    pub fn with_revalidate_hook(mut self, hook: RevalidateHook) -> Self {
        self.cache_first = self.cache_first.with_revalidate_hook(hook);
        self
    }

    /// Route one intercepted request through its strategy.
    ///
    /// Returns `Ok(None)` for out-of-scope requests, which must pass
    /// through uninterfered.
    pub async fn handle_fetch(&self, req: &GatewayRequest) -> Result<Option<GatewayResponse>, Error> {
        let route = self.selector.classify(req);
        tracing::trace!(url = %req.url, ?route, "routing intercepted request");

        match route {
            Route::Passthrough => Ok(None),
            Route::CacheFirst => self.cache_first.serve(req).await.map(Some),
            Route::NetworkFirst => self.network_first.serve(req).await.map(Some),
            Route::BoundedNetworkFirst => self.bounded.serve(req).await.map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{Destination, ServedFrom};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tablemate_core::CachedResponse;

    struct EchoFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Fetcher for EchoFetcher {
        async fn fetch(&self, req: &GatewayRequest) -> Result<GatewayResponse, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(GatewayResponse {
                url: req.url.to_string(),
                status: 200,
                headers: vec![],
                body: Bytes::from(req.url.path().to_string()),
                served_from: ServedFrom::Network,
                fetch_ms: Some(1),
            })
        }
    }

    async fn gateway(store: CacheStore) -> Gateway {
        let fetcher = Arc::new(EchoFetcher { calls: AtomicUsize::new(0) });
        Gateway::new(&AppConfig::default(), store, fetcher).unwrap()
    }

    #[tokio::test]
    async fn test_third_party_is_not_intercepted() {
        let store = CacheStore::open_in_memory().await.unwrap();
        let gw = gateway(store).await;

        let req = GatewayRequest::get("https://cdn.example.com/lib.js", Destination::Script).unwrap();
        let result = gw.handle_fetch(&req).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_api_request_is_served_and_cached() {
        let store = CacheStore::open_in_memory().await.unwrap();
        let gw = gateway(store.clone()).await;

        let req = GatewayRequest::get("https://xyz.supabase.co/rest/v1/dinners", Destination::Other).unwrap();
        let response = gw.handle_fetch(&req).await.unwrap().unwrap();
        assert_eq!(response.served_from, ServedFrom::Network);

        let config = AppConfig::default();
        let cached = store
            .match_request(&config.dynamic_partition(), "GET", req.url.as_str())
            .await
            .unwrap();
        assert!(cached.is_some());
    }

    #[tokio::test]
    async fn test_asset_hit_is_served_from_static_partition() {
        let store = CacheStore::open_in_memory().await.unwrap();
        let config = AppConfig::default();
        let snapshot = CachedResponse::new("GET", "https://tablemate.app/app.css", 200, vec![], b"cached css".to_vec());
        store.upsert_entry(&config.static_partition(), &snapshot).await.unwrap();

        let gw = gateway(store).await;
        let req = GatewayRequest::get("https://tablemate.app/app.css", Destination::Style).unwrap();
        let response = gw.handle_fetch(&req).await.unwrap().unwrap();

        assert_eq!(response.served_from, ServedFrom::Cache);
        assert_eq!(response.body, Bytes::from_static(b"cached css"));
    }

    #[tokio::test]
    async fn test_navigation_goes_through_bounded_strategy() {
        let store = CacheStore::open_in_memory().await.unwrap();
        let gw = gateway(store).await;

        let req = GatewayRequest::document("https://tablemate.app/discover").unwrap();
        let response = gw.handle_fetch(&req).await.unwrap().unwrap();
        assert_eq!(response.served_from, ServedFrom::Network);
        assert_eq!(response.body, Bytes::from_static(b"/discover"));
    }
}
