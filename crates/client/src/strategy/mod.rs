//! Fetch strategy selection and the three serving policies.
//!
//! ### Routing
//! - API data paths -> network-first (freshness wins)
//! - Scripts, stylesheets, images -> cache-first (latency wins)
//! - Document navigations -> network-first with a latency bound
//! - Everything else, and anything out of scope -> passthrough
//!
//! Out-of-scope requests (neither the app origin nor the backend host)
//! are never intercepted, so the gateway cannot poison or block
//! third-party calls.

pub mod bounded;
pub mod cache_first;
pub mod network_first;

use regex::Regex;
use url::Url;

use crate::fetch::{Destination, GatewayRequest};
use tablemate_core::{AppConfig, Error};

pub use bounded::BoundedNetworkFirst;
pub use cache_first::{CacheFirst, RevalidateHook};
pub use network_first::NetworkFirst;

/// Strategy chosen for an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    CacheFirst,
    NetworkFirst,
    BoundedNetworkFirst,
    /// Not intercepted; the host performs its default fetch.
    Passthrough,
}

/// Classifies intercepted requests into exactly one strategy.
///
/// Does no I/O itself; the chosen strategy performs the work.
pub struct StrategySelector {
    origin_host: String,
    backend_host: String,
    api_patterns: Vec<Regex>,
}

impl StrategySelector {
    /// Build a selector from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the origin doesn't parse or an API pattern
    /// is not a valid regex (config validation catches these earlier,
    /// but the selector can be constructed standalone too).
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let origin_host = origin
            .host_str()
            .ok_or_else(|| Error::InvalidUrl(format!("origin {} has no host", config.origin)))?
            .to_string();

        let api_patterns = config
            .api_patterns
            .iter()
            .map(|p| Regex::new(p).map_err(|e| Error::InvalidInput(format!("bad api pattern '{p}': {e}"))))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { origin_host, backend_host: config.backend_host.clone(), api_patterns })
    }

    /// Decide which strategy handles a request.
    pub fn classify(&self, req: &GatewayRequest) -> Route {
        if !self.in_scope(&req.url) {
            return Route::Passthrough;
        }

        if self.api_patterns.iter().any(|p| p.is_match(req.url.path())) {
            return Route::NetworkFirst;
        }

        match req.destination {
            Destination::Script | Destination::Style | Destination::Image => Route::CacheFirst,
            Destination::Document => Route::BoundedNetworkFirst,
            Destination::Other => Route::Passthrough,
        }
    }

    /// Same-origin, or hosted on the managed backend.
    fn in_scope(&self, url: &Url) -> bool {
        match url.host_str() {
            Some(host) => host == self.origin_host || host.contains(&self.backend_host),
            None => false,
        }
    }
}
