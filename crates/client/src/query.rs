//! Query caching for application data hooks.
//!
//! Composes the deduplicator and the TTL cache: a fresh entry is served
//! without touching the producer, a miss runs the producer exactly once
//! per burst of concurrent callers, and ok results are stored for the
//! entry's TTL. This is the layer data-fetching hooks go through between
//! renders and navigations.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::dedup::Deduplicator;
use crate::ttl::TtlCache;
use tablemate_core::Error;

/// Deduplicated, TTL-cached access to backend queries.
#[derive(Clone)]
pub struct QueryCache<T: Clone> {
    ttl: TtlCache<T>,
    dedup: Deduplicator<T>,
    default_ttl: Duration,
}

impl<T: Clone + Send + Sync + 'static> QueryCache<T> {
    /// Create a cache with a nominal capacity and a default entry TTL.
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self { ttl: TtlCache::new(capacity), dedup: Deduplicator::new(), default_ttl }
    }

    /// Serve `key` from cache, or run `producer` (deduplicated) and
    /// store the result. `ttl` of None uses the cache default.
    ///
    /// Keys are compounds of entity type and identifiers, e.g.
    /// `dinner:42:attendees` — the same key must always mean the same
    /// logical query.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, ttl: Option<Duration>, producer: F) -> Result<T, Arc<Error>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, Error>> + Send + 'static,
    {
        if let Some(value) = self.ttl.get(key).await {
            tracing::trace!("query cache hit for {key}");
            return Ok(value);
        }

        let ttl_cache = self.ttl.clone();
        let owned_key = key.to_string();
        let entry_ttl = ttl.unwrap_or(self.default_ttl);

        self.dedup
            .run(key, move || async move {
                let value = producer().await?;
                ttl_cache.set(&owned_key, value.clone(), entry_ttl).await;
                Ok(value)
            })
            .await
    }

    /// Drop one cached query result.
    pub async fn invalidate(&self, key: &str) {
        self.ttl.invalidate(key).await;
    }

    /// Drop everything, e.g. on sign-out.
    pub async fn clear(&self) {
        self.ttl.clear().await;
    }

    /// Spawn the periodic expiry sweep for the underlying TTL cache.
    pub fn spawn_sweeper(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        self.ttl.spawn_sweeper(interval)
    }
}
