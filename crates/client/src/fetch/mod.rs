//! HTTP fetch client behind the [`Fetcher`] seam.
//!
//! The strategies never talk to reqwest directly. They hold an
//! `Arc<dyn Fetcher>` so tests can substitute slow, failing, or
//! counting fetchers without any network.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method};
use url::Url;

use tablemate_core::{CachedResponse, Error};

/// Resource destination of an intercepted request, as reported by the
/// host that intercepted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Full document navigation.
    Document,
    Script,
    Style,
    Image,
    /// Anything else (fonts, media, API payloads, ...).
    Other,
}

/// An intercepted request routed through the gateway.
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    pub method: String,
    pub url: Url,
    pub destination: Destination,
}

impl GatewayRequest {
    /// Build a GET request for the given URL and destination.
    pub fn get(url: &str, destination: Destination) -> Result<Self, Error> {
        let url = Url::parse(url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self { method: "GET".to_string(), url, destination })
    }

    /// Build a document navigation request.
    pub fn document(url: &str) -> Result<Self, Error> {
        Self::get(url, Destination::Document)
    }
}

/// Where a gateway response was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
    Network,
    Cache,
}

impl std::fmt::Display for ServedFrom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Cache => write!(f, "cache"),
        }
    }
}

/// Response returned by the gateway to the intercepting host.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub served_from: ServedFrom,
    /// Time taken to fetch in milliseconds; None for cache hits.
    pub fetch_ms: Option<u64>,
}

impl GatewayResponse {
    /// Whether the response carries a success status.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Replay a stored snapshot as a response.
    pub fn from_cached(entry: CachedResponse) -> Self {
        Self {
            url: entry.url,
            status: entry.status,
            headers: entry.headers,
            body: Bytes::from(entry.body),
            served_from: ServedFrom::Cache,
            fetch_ms: None,
        }
    }

    /// Capture this response as a storable snapshot for the request
    /// that produced it.
    pub fn to_cached(&self, req: &GatewayRequest) -> CachedResponse {
        CachedResponse::new(
            &req.method,
            req.url.as_str(),
            self.status,
            self.headers.clone(),
            self.body.to_vec(),
        )
    }
}

/// Network access seam for the fetch strategies.
///
/// Implementations return `Ok` for any HTTP status; `Err` means the
/// transport itself failed (refused, timed out, DNS). Non-ok statuses
/// are a caller concern, which is what lets network-first return live
/// error responses without caching them.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, req: &GatewayRequest) -> Result<GatewayResponse, Error>;
}

/// Configuration for the network client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "tablemate-gateway/0.1")
    pub user_agent: String,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "tablemate-gateway/0.1".to_string(),
            timeout: Duration::from_millis(20_000),
            max_redirects: 5,
        }
    }
}

/// Real HTTP client used outside of tests.
pub struct NetworkClient {
    http: Client,
    config: FetchConfig,
}

impl NetworkClient {
    /// Create a new network client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl Fetcher for NetworkClient {
    async fn fetch(&self, req: &GatewayRequest) -> Result<GatewayResponse, Error> {
        let start = Instant::now();
        let method = Method::from_bytes(req.method.as_bytes())
            .map_err(|e| Error::InvalidInput(format!("bad method {}: {e}", req.method)))?;

        let response = self
            .http
            .request(method, req.url.clone())
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status().as_u16();
        let url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect();

        let body = response.bytes().await.map_err(|e| Error::Http(e.to_string()))?;

        let fetch_ms = start.elapsed().as_millis() as u64;
        tracing::debug!("fetched {} -> {} in {}ms ({} bytes)", req.url, status, fetch_ms, body.len());

        Ok(GatewayResponse {
            url,
            status,
            headers,
            body,
            served_from: ServedFrom::Network,
            fetch_ms: Some(fetch_ms),
        })
    }
}
