//! Bounded-latency network-first serving for document navigations.
//!
//! Races the network-first strategy against a fixed timer. Whichever
//! settles first wins; the worst-case wait for a page load is the
//! timer, not the network timeout. The network task is never
//! cancelled: if the timer wins, the fetch keeps running and its
//! success path still populates the dynamic partition for next time.

use std::time::Duration;

use super::network_first::NetworkFirst;
use crate::fetch::{GatewayRequest, GatewayResponse};
use tablemate_core::{CacheStore, Error};

/// Network-first with a latency bound, for navigations where perceived
/// latency matters more than freshness.
pub struct BoundedNetworkFirst {
    inner: NetworkFirst,
    store: CacheStore,
    partition: String,
    nav_timeout: Duration,
}

impl BoundedNetworkFirst {
    pub fn new(inner: NetworkFirst, store: CacheStore, partition: String, nav_timeout: Duration) -> Self {
        Self { inner, store, partition, nav_timeout }
    }

    /// Serve a navigation, waiting at most `nav_timeout` for the network.
    ///
    /// If the timer fires first, the cached copy is served regardless of
    /// network state; with no cached copy either, [`Error::Offline`] is
    /// returned and the host's default failure handling takes over.
    pub async fn serve(&self, req: &GatewayRequest) -> Result<GatewayResponse, Error> {
        let network = {
            let inner = self.inner.clone();
            let req = req.clone();
            tokio::spawn(async move { inner.serve(&req).await })
        };

        let timer = tokio::time::sleep(self.nav_timeout);
        tokio::pin!(timer);

        tokio::select! {
            joined = network => match joined {
                Ok(result) => result,
                Err(e) => Err(Error::Http(format!("navigation task failed: {e}"))),
            },
            _ = &mut timer => {
                // Timer won; the spawned fetch is left to finish on its
                // own and update the partition as a side effect.
                match self.store.match_request(&self.partition, &req.method, req.url.as_str()).await? {
                    Some(entry) => {
                        tracing::debug!(
                            "serving cached navigation for {} at the {}ms bound",
                            req.url,
                            self.nav_timeout.as_millis()
                        );
                        Ok(GatewayResponse::from_cached(entry))
                    }
                    None => Err(Error::Offline(req.url.to_string())),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{Destination, Fetcher, ServedFrom};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::Arc;
    use tablemate_core::CachedResponse;
    use tokio::time::Instant;

    const PARTITION: &str = "tablemate-dynamic-v2";

    struct SlowFetcher {
        delay: Duration,
        body: &'static [u8],
    }

    #[async_trait]
    impl Fetcher for SlowFetcher {
        async fn fetch(&self, req: &GatewayRequest) -> Result<GatewayResponse, Error> {
            tokio::time::sleep(self.delay).await;
            Ok(GatewayResponse {
                url: req.url.to_string(),
                status: 200,
                headers: vec![],
                body: Bytes::from_static(self.body),
                served_from: ServedFrom::Network,
                fetch_ms: Some(self.delay.as_millis() as u64),
            })
        }
    }

    fn strategy(store: CacheStore, fetcher: Arc<dyn Fetcher>, nav_timeout: Duration) -> BoundedNetworkFirst {
        let inner = NetworkFirst::new(store.clone(), fetcher, PARTITION.to_string());
        BoundedNetworkFirst::new(inner, store, PARTITION.to_string(), nav_timeout)
    }

    fn nav_req() -> GatewayRequest {
        GatewayRequest::document("https://tablemate.app/discover").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_network_loses_to_cached_copy() {
        let store = CacheStore::open_in_memory().await.unwrap();
        let req = nav_req();
        let snapshot = CachedResponse::new("GET", req.url.as_str(), 200, vec![], b"cached page".to_vec());
        store.upsert_entry(PARTITION, &snapshot).await.unwrap();

        let fetcher = Arc::new(SlowFetcher { delay: Duration::from_secs(5), body: b"fresh page" });
        let strategy = strategy(store, fetcher, Duration::from_millis(500));

        let start = Instant::now();
        let response = strategy.serve(&req).await.unwrap();

        assert_eq!(response.served_from, ServedFrom::Cache);
        assert_eq!(response.body, Bytes::from_static(b"cached page"));
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    // Runs on the real clock: under a paused clock the spawned fetch's
    // sqlite write happens on an external thread, the runtime looks idle,
    // and auto-advance fires the nav timer before the join handle settles.
    #[tokio::test]
    async fn test_fast_network_wins() {
        let store = CacheStore::open_in_memory().await.unwrap();
        let req = nav_req();
        let snapshot = CachedResponse::new("GET", req.url.as_str(), 200, vec![], b"cached page".to_vec());
        store.upsert_entry(PARTITION, &snapshot).await.unwrap();

        let fetcher = Arc::new(SlowFetcher { delay: Duration::from_millis(10), body: b"fresh page" });
        let strategy = strategy(store, fetcher, Duration::from_millis(500));

        let response = strategy.serve(&req).await.unwrap();
        assert_eq!(response.served_from, ServedFrom::Network);
        assert_eq!(response.body, Bytes::from_static(b"fresh page"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_with_no_cache_is_a_miss() {
        let store = CacheStore::open_in_memory().await.unwrap();
        let fetcher = Arc::new(SlowFetcher { delay: Duration::from_secs(5), body: b"fresh page" });
        let strategy = strategy(store, fetcher, Duration::from_millis(500));

        let result = strategy.serve(&nav_req()).await;
        assert!(matches!(result, Err(Error::Offline(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_losing_fetch_still_populates_cache() {
        let store = CacheStore::open_in_memory().await.unwrap();
        let req = nav_req();
        let snapshot = CachedResponse::new("GET", req.url.as_str(), 200, vec![], b"cached page".to_vec());
        store.upsert_entry(PARTITION, &snapshot).await.unwrap();

        let fetcher = Arc::new(SlowFetcher { delay: Duration::from_secs(2), body: b"fresh page" });
        let strategy = strategy(store.clone(), fetcher, Duration::from_millis(500));

        let response = strategy.serve(&req).await.unwrap();
        assert_eq!(response.served_from, ServedFrom::Cache);

        // Let the abandoned fetch run to completion and land its write.
        tokio::time::sleep(Duration::from_secs(3)).await;
        let mut body = Vec::new();
        for _ in 0..200 {
            let entry = store
                .match_request(PARTITION, "GET", req.url.as_str())
                .await
                .unwrap()
                .unwrap();
            body = entry.body;
            if body == b"fresh page" {
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
            tokio::task::yield_now().await;
        }
        assert_eq!(body, b"fresh page");
    }
}
