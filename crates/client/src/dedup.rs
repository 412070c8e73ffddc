//! In-flight request deduplication.
//!
//! Collapses concurrent identical operations into one shared future.
//! The ticket lives only while the producer is pending: it is removed
//! as soon as the result settles, success or failure, so a later call
//! with the same key always triggers a fresh invocation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};

use tablemate_core::Error;

type Ticket<T> = Shared<BoxFuture<'static, Result<T, Arc<Error>>>>;

/// Collapses concurrent same-key operations into a single producer call.
///
/// Keys are caller-chosen strings and collisions are the mechanism:
/// callers must pick keys that identify the logical operation, not the
/// call site. Explicitly constructed, not a global; share one instance
/// by cloning.
pub struct Deduplicator<T: Clone> {
    inflight: Arc<Mutex<HashMap<String, Ticket<T>>>>,
}

impl<T: Clone> Clone for Deduplicator<T> {
    fn clone(&self) -> Self {
        Self { inflight: Arc::clone(&self.inflight) }
    }
}

impl<T: Clone> Default for Deduplicator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Deduplicator<T> {
    pub fn new() -> Self {
        Self { inflight: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Number of operations currently in flight.
    pub fn in_flight(&self) -> usize {
        self.inflight.lock().unwrap().len()
    }
}

impl<T: Clone + Send + Sync + 'static> Deduplicator<T> {
    /// Run `producer` for `key`, joining an in-flight call if one exists.
    ///
    /// For any burst of concurrent calls with the same key the producer
    /// executes exactly once; every caller observes the same resolved
    /// value or the same error (behind an `Arc`, since the waiters
    /// share it).
    pub async fn run<F, Fut>(&self, key: &str, producer: F) -> Result<T, Arc<Error>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Error>> + Send + 'static,
    {
        let ticket = {
            let mut inflight = self.inflight.lock().unwrap();
            if let Some(existing) = inflight.get(key) {
                tracing::debug!("joining in-flight operation for {key}");
                existing.clone()
            } else {
                let registry = Arc::clone(&self.inflight);
                let owned_key = key.to_string();
                let fut = producer();
                let ticket: Ticket<T> = async move {
                    let outcome = fut.await.map_err(Arc::new);
                    // Clear the ticket the moment the producer settles,
                    // whatever the outcome.
                    registry.lock().unwrap().remove(&owned_key);
                    outcome
                }
                .boxed()
                .shared();
                inflight.insert(key.to_string(), ticket.clone());
                ticket
            }
        };

        ticket.await
    }
}
