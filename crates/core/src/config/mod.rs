//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (TABLEMATE_*)
//! 2. TOML config file (if TABLEMATE_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! The cache version tag lives here on purpose: partition names derived
//! from it are the only invalidation lever for the durable partitions,
//! so they must never be hardcoded in the store or the strategies.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (TABLEMATE_*)
/// 2. TOML config file (if TABLEMATE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite cache store.
    ///
    /// Set via TABLEMATE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Application origin. Requests to this host are in scope for
    /// interception.
    ///
    /// Set via TABLEMATE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Backend host pattern. Requests whose host contains this string
    /// are in scope even when cross-origin (the managed backend lives
    /// on its own domain).
    ///
    /// Set via TABLEMATE_BACKEND_HOST environment variable.
    #[serde(default = "default_backend_host")]
    pub backend_host: String,

    /// Cache version tag. Bumping this invalidates both durable
    /// partitions on the next activation.
    ///
    /// Set via TABLEMATE_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Legacy partition name retained from before version tagging.
    /// Kept only so activation cleanup recognizes it.
    #[serde(default = "default_legacy_partition")]
    pub legacy_partition: String,

    /// Shell routes pre-cached into the static partition on install.
    #[serde(default = "default_precache_routes")]
    pub precache_routes: Vec<String>,

    /// Path regexes routed network-first (data endpoints).
    #[serde(default = "default_api_patterns")]
    pub api_patterns: Vec<String>,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via TABLEMATE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via TABLEMATE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Latency bound for document navigations in milliseconds. The
    /// bounded strategy serves the cached copy once this much time has
    /// passed without a network result.
    ///
    /// Set via TABLEMATE_NAV_TIMEOUT_MS environment variable.
    #[serde(default = "default_nav_timeout_ms")]
    pub nav_timeout_ms: u64,

    /// Nominal entry bound for the in-memory query cache.
    #[serde(default = "default_query_capacity")]
    pub query_capacity: usize,

    /// Default TTL for query cache entries in minutes.
    #[serde(default = "default_query_ttl_minutes")]
    pub query_ttl_minutes: u64,

    /// Interval between query cache sweeps in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./tablemate-cache.sqlite")
}

fn default_origin() -> String {
    "https://tablemate.app".into()
}

fn default_backend_host() -> String {
    "supabase.co".into()
}

fn default_cache_version() -> String {
    "v2".into()
}

fn default_legacy_partition() -> String {
    "tablemate-cache".into()
}

fn default_precache_routes() -> Vec<String> {
    ["/", "/auth", "/my-dinners", "/discover", "/manifest.json"]
        .map(String::from)
        .to_vec()
}

fn default_api_patterns() -> Vec<String> {
    ["^/rest/v1/", "^/dinners", "^/profiles"].map(String::from).to_vec()
}

fn default_user_agent() -> String {
    "tablemate-gateway/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_nav_timeout_ms() -> u64 {
    500
}

fn default_query_capacity() -> usize {
    100
}

fn default_query_ttl_minutes() -> u64 {
    5
}

fn default_sweep_interval_secs() -> u64 {
    300
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            backend_host: default_backend_host(),
            cache_version: default_cache_version(),
            legacy_partition: default_legacy_partition(),
            precache_routes: default_precache_routes(),
            api_patterns: default_api_patterns(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            nav_timeout_ms: default_nav_timeout_ms(),
            query_capacity: default_query_capacity(),
            query_ttl_minutes: default_query_ttl_minutes(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl AppConfig {
    /// Name of the static (shell asset) partition for the current version.
    pub fn static_partition(&self) -> String {
        format!("tablemate-static-{}", self.cache_version)
    }

    /// Name of the dynamic (runtime response) partition for the current version.
    pub fn dynamic_partition(&self) -> String {
        format!("tablemate-dynamic-{}", self.cache_version)
    }

    /// Partition names that survive activation cleanup.
    pub fn live_partitions(&self) -> [String; 3] {
        [
            self.static_partition(),
            self.dynamic_partition(),
            self.legacy_partition.clone(),
        ]
    }

    /// Request timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Navigation latency bound as Duration.
    pub fn nav_timeout(&self) -> Duration {
        Duration::from_millis(self.nav_timeout_ms)
    }

    /// Default query cache TTL as Duration.
    pub fn query_ttl(&self) -> Duration {
        Duration::from_secs(self.query_ttl_minutes * 60)
    }

    /// Sweep interval as Duration.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `TABLEMATE_`
    /// 2. TOML file from `TABLEMATE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("TABLEMATE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("TABLEMATE_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./tablemate-cache.sqlite"));
        assert_eq!(config.origin, "https://tablemate.app");
        assert_eq!(config.cache_version, "v2");
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.nav_timeout_ms, 500);
        assert_eq!(config.query_capacity, 100);
        assert_eq!(config.precache_routes.len(), 5);
        assert_eq!(config.api_patterns.len(), 3);
    }

    #[test]
    fn test_partition_names_follow_version() {
        let config = AppConfig { cache_version: "v7".into(), ..Default::default() };
        assert_eq!(config.static_partition(), "tablemate-static-v7");
        assert_eq!(config.dynamic_partition(), "tablemate-dynamic-v7");
    }

    #[test]
    fn test_live_partitions_include_legacy() {
        let config = AppConfig::default();
        let live = config.live_partitions();
        assert!(live.contains(&"tablemate-cache".to_string()));
    }

    #[test]
    fn test_timeout_durations() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
        assert_eq!(config.nav_timeout(), Duration::from_millis(500));
        assert_eq!(config.query_ttl(), Duration::from_secs(300));
        assert_eq!(config.sweep_interval(), Duration::from_secs(300));
    }
}
