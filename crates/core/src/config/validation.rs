//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `nav_timeout_ms` is outside 50ms - 10s
    /// - `cache_version` is empty or contains whitespace
    /// - `origin` is not a parseable URL
    /// - any API pattern is not a valid regex
    /// - any pre-cache route is not an absolute path
    /// - `query_capacity` is 0 or `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.nav_timeout_ms < 50 || self.nav_timeout_ms > 10_000 {
            return Err(ConfigError::Invalid {
                field: "nav_timeout_ms".into(),
                reason: "must be between 50ms and 10000ms".into(),
            });
        }

        if self.cache_version.is_empty() || self.cache_version.contains(char::is_whitespace) {
            return Err(ConfigError::Invalid {
                field: "cache_version".into(),
                reason: "must be a non-empty tag without whitespace".into(),
            });
        }

        if url::Url::parse(&self.origin).is_err() {
            return Err(ConfigError::Invalid { field: "origin".into(), reason: "must be a valid URL".into() });
        }

        for pattern in &self.api_patterns {
            if regex::Regex::new(pattern).is_err() {
                return Err(ConfigError::Invalid {
                    field: "api_patterns".into(),
                    reason: format!("'{pattern}' is not a valid regex"),
                });
            }
        }

        for route in &self.precache_routes {
            if !route.starts_with('/') {
                return Err(ConfigError::Invalid {
                    field: "precache_routes".into(),
                    reason: format!("'{route}' must be an absolute path"),
                });
            }
        }

        if self.query_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "query_capacity".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_timeout_too_small() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_nav_timeout_bounds() {
        let config = AppConfig { nav_timeout_ms: 20, ..Default::default() };
        assert!(config.validate().is_err());

        let config = AppConfig { nav_timeout_ms: 20_000, ..Default::default() };
        assert!(config.validate().is_err());

        let config = AppConfig { nav_timeout_ms: 500, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_version() {
        let config = AppConfig { cache_version: "".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_version"));
    }

    #[test]
    fn test_validate_version_with_whitespace() {
        let config = AppConfig { cache_version: "v 2".into(), ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_origin() {
        let config = AppConfig { origin: "not a url".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "origin"));
    }

    #[test]
    fn test_validate_bad_api_pattern() {
        let config = AppConfig { api_patterns: vec!["[unclosed".into()], ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "api_patterns"));
    }

    #[test]
    fn test_validate_relative_precache_route() {
        let config = AppConfig { precache_routes: vec!["discover".into()], ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "precache_routes"));
    }

    #[test]
    fn test_validate_zero_capacity() {
        let config = AppConfig { query_capacity: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }
}
