//! Short-lived in-memory cache with lazy expiry.
//!
//! Entries carry their own TTL and are removed lazily on read, during
//! the capacity-triggered cleanup pass, or by the periodic sweeper.
//! Unlike the durable partitions there is no version tag here; this
//! layer only bridges renders and navigations within one process.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;

struct Entry<T> {
    value: T,
    stored_at: Instant,
    ttl: Duration,
    last_used: Instant,
}

impl<T> Entry<T> {
    fn is_expired(&self) -> bool {
        self.stored_at.elapsed() > self.ttl
    }
}

/// TTL-bounded key→value cache with a nominal capacity.
///
/// Explicitly constructed and shared by cloning; tests get isolated
/// instances instead of module-level state. When the capacity is hit,
/// expired entries are cleaned up first; if every entry is still fresh
/// the least-recently-used one is evicted so the store cannot grow
/// past its bound.
pub struct TtlCache<T> {
    entries: Arc<RwLock<HashMap<String, Entry<T>>>>,
    capacity: usize,
}

impl<T> Clone for TtlCache<T> {
    fn clone(&self) -> Self {
        Self { entries: Arc::clone(&self.entries), capacity: self.capacity }
    }
}

impl<T: Clone + Send + Sync + 'static> TtlCache<T> {
    pub fn new(capacity: usize) -> Self {
        Self { entries: Arc::new(RwLock::new(HashMap::new())), capacity }
    }

    /// Insert a value with its own TTL, evicting as needed.
    pub async fn set(&self, key: &str, value: T, ttl: Duration) {
        let mut entries = self.entries.write().await;

        if entries.len() >= self.capacity {
            entries.retain(|_, e| !e.is_expired());

            if entries.len() >= self.capacity {
                let lru_key = entries.iter().min_by_key(|(_, e)| e.last_used).map(|(k, _)| k.clone());
                if let Some(lru_key) = lru_key {
                    tracing::debug!("evicting least-recently-used entry {lru_key}");
                    entries.remove(&lru_key);
                }
            }
        }

        let now = Instant::now();
        entries.insert(key.to_string(), Entry { value, stored_at: now, ttl, last_used: now });
    }

    /// Look up a value; absent and expired both read as a miss.
    pub async fn get(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.write().await;
        match entries.get_mut(key) {
            Some(entry) if entry.is_expired() => {
                entries.remove(key);
                None
            }
            Some(entry) => {
                entry.last_used = Instant::now();
                Some(entry.value.clone())
            }
            None => None,
        }
    }

    /// Remove one entry.
    pub async fn invalidate(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    /// Remove everything.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Current entry count, expired entries included until swept.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Drop all expired entries, returning how many were removed.
    pub async fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired());
        before - entries.len()
    }

    /// Spawn a periodic sweep that removes expired entries independent
    /// of reads. The composition root owns the handle; dropping the
    /// cache does not stop the sweeper, aborting the handle does.
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick fires immediately; skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = cache.cleanup_expired().await;
                if removed > 0 {
                    tracing::debug!("sweeper removed {removed} expired entries");
                }
            }
        })
    }
}
