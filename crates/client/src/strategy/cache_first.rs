//! Cache-first serving for static shell assets.
//!
//! A hit never blocks on the network: the cached copy is returned
//! immediately and a background revalidation refreshes the entry for
//! next time. Revalidation failures are swallowed; they are a
//! best-effort optimization, not a correctness requirement.

use std::sync::Arc;

use url::Url;

use crate::fetch::{Destination, Fetcher, GatewayRequest, GatewayResponse};
use tablemate_core::{CacheStore, Error};

/// Diagnostic callback invoked when a background revalidation fails.
///
/// The failure still never surfaces to the original caller; this only
/// makes the swallowed path observable.
pub type RevalidateHook = Arc<dyn Fn(&str, &Error) + Send + Sync>;

/// Cache-first strategy over the static partition.
#[derive(Clone)]
pub struct CacheFirst {
    store: CacheStore,
    fetcher: Arc<dyn Fetcher>,
    partition: String,
    root_url: Url,
    revalidate_hook: Option<RevalidateHook>,
}

impl CacheFirst {
    /// Create the strategy. `origin` supplies the root document used as
    /// the last-resort fallback for failed navigations.
    pub fn new(store: CacheStore, fetcher: Arc<dyn Fetcher>, partition: String, origin: &Url) -> Self {
        let mut root_url = origin.clone();
        root_url.set_path("/");
        Self { store, fetcher, partition, root_url, revalidate_hook: None }
    }

    /// Attach a diagnostic hook for background revalidation failures.
    pub fn with_revalidate_hook(mut self, hook: RevalidateHook) -> Self {
        self.revalidate_hook = Some(hook);
        self
    }

    /// Serve a request, preferring the cached copy.
    pub async fn serve(&self, req: &GatewayRequest) -> Result<GatewayResponse, Error> {
        if let Some(entry) = self.store.match_request(&self.partition, &req.method, req.url.as_str()).await? {
            self.spawn_revalidate(req.clone());
            return Ok(GatewayResponse::from_cached(entry));
        }

        match self.fetcher.fetch(req).await {
            Ok(response) => {
                if response.is_ok() {
                    self.store.upsert_entry(&self.partition, &response.to_cached(req)).await?;
                }
                Ok(response)
            }
            Err(err) => {
                if req.destination == Destination::Document
                    && let Some(root) = self
                        .store
                        .match_request(&self.partition, "GET", self.root_url.as_str())
                        .await?
                {
                    tracing::debug!("serving cached shell for failed navigation to {}", req.url);
                    return Ok(GatewayResponse::from_cached(root));
                }
                Err(err)
            }
        }
    }

    /// Refresh a cached entry without blocking the caller.
    fn spawn_revalidate(&self, req: GatewayRequest) {
        let store = self.store.clone();
        let fetcher = Arc::clone(&self.fetcher);
        let partition = self.partition.clone();
        let hook = self.revalidate_hook.clone();

        tokio::spawn(async move {
            let refresh = async {
                let response = fetcher.fetch(&req).await?;
                if response.is_ok() {
                    store.upsert_entry(&partition, &response.to_cached(&req)).await?;
                }
                Ok::<_, Error>(())
            };

            if let Err(err) = refresh.await {
                tracing::debug!("background revalidation failed for {}: {}", req.url, err);
                if let Some(hook) = hook {
                    hook(req.url.as_str(), &err);
                }
            }
        });
    }
}
