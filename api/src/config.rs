//! Client configuration
//!
//! Settings are read from the environment:
//!
//! | Variable | Default |
//! |----------|---------|
//! | `STOREFRONT_API_URL` | `http://localhost:8000/api/v1` |
//! | `STOREFRONT_STORAGE_URL` | unset (avatar uploads disabled) |
//! | `STOREFRONT_HTTP_TIMEOUT_SECS` | `30` |

use crate::error::ConfigError;
use std::time::Duration;

/// Base URL used when `STOREFRONT_API_URL` is unset
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Request timeout used when `STOREFRONT_HTTP_TIMEOUT_SECS` is unset
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const API_URL_VAR: &str = "STOREFRONT_API_URL";
const STORAGE_URL_VAR: &str = "STOREFRONT_STORAGE_URL";
const TIMEOUT_VAR: &str = "STOREFRONT_HTTP_TIMEOUT_SECS";

/// Configuration of the REST and object storage clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// REST API base URL, without trailing slash
    pub base_url: String,
    /// Object storage bucket URL, without trailing slash
    pub storage_url: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ApiConfig {
    /// Configuration for the given API base URL
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: trim_slash(base_url.into()),
            storage_url: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Read the configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an invalid value
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through a variable lookup function
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an invalid value
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(API_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut config = Self::new(validate_url(API_URL_VAR, base_url)?);

        if let Some(storage_url) = lookup(STORAGE_URL_VAR).filter(|v| !v.trim().is_empty()) {
            config = config.with_storage_url(validate_url(STORAGE_URL_VAR, storage_url)?);
        }

        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let seconds = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or(ConfigError::InvalidTimeout {
                    key: TIMEOUT_VAR,
                    value: raw.clone(),
                })?;
            config = config.with_timeout(Duration::from_secs(seconds));
        }

        Ok(config)
    }

    /// Set the object storage bucket URL
    #[must_use]
    pub fn with_storage_url(mut self, storage_url: impl Into<String>) -> Self {
        self.storage_url = Some(trim_slash(storage_url.into()));
        self
    }

    /// Set the per-request timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn validate_url(key: &'static str, value: String) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Err(ConfigError::InvalidUrl { key, value })
    }
}

fn trim_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code can unwrap

    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.storage_url, None);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn reads_all_variables() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("STOREFRONT_API_URL", "https://shop.example.com/api/v1/"),
            ("STOREFRONT_STORAGE_URL", "https://storage.example.com/v0/b/shop"),
            ("STOREFRONT_HTTP_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "https://shop.example.com/api/v1");
        assert_eq!(
            config.storage_url.as_deref(),
            Some("https://storage.example.com/v0/b/shop")
        );
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn rejects_invalid_values() {
        assert_eq!(
            ApiConfig::from_lookup(lookup(&[("STOREFRONT_API_URL", "localhost:8000")])),
            Err(ConfigError::InvalidUrl {
                key: "STOREFRONT_API_URL",
                value: "localhost:8000".to_string(),
            })
        );
        assert!(matches!(
            ApiConfig::from_lookup(lookup(&[("STOREFRONT_HTTP_TIMEOUT_SECS", "0")])),
            Err(ConfigError::InvalidTimeout { .. })
        ));
    }
}
