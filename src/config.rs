//! Facade configuration.

use crate::error::{Error, Result};
use serde::Deserialize;

/// Default time-to-live, in minutes, for `set` calls without an explicit expiry.
pub const DEFAULT_TIMEOUT_MINUTES: i64 = 10;

/// Default size of the worker pool used by async operations.
/// Override with the `CACHE_PLEX_WORKERS` environment variable.
pub const DEFAULT_WORKER_THREADS: usize = 4;

/// Overrides `enabled` in `CacheConfig::from_env`.
pub const ENV_ENABLED: &str = "CACHE_PLEX_ENABLED";
/// Overrides `default_timeout` (minutes).
pub const ENV_DEFAULT_TIMEOUT: &str = "CACHE_PLEX_DEFAULT_TIMEOUT";
/// Overrides `namespace`.
pub const ENV_NAMESPACE: &str = "CACHE_PLEX_NAMESPACE";
/// Overrides `worker_threads`.
pub const ENV_WORKERS: &str = "CACHE_PLEX_WORKERS";

/// Configuration for [`crate::Cache`].
///
/// ```
/// use cache_plex::CacheConfig;
///
/// let config = CacheConfig::default()
///     .with_namespace("shop")
///     .with_default_timeout(30);
/// assert!(config.enabled);
/// assert_eq!(config.namespace, "shop");
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// When false every operation is a silent no-op.
    pub enabled: bool,
    /// Minutes applied by `Expiry::Default`.
    pub default_timeout: i64,
    /// Prefix mixed into every key built by the facade.
    pub namespace: String,
    /// Upper bound on threads running async operations.
    pub worker_threads: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            enabled: true,
            default_timeout: DEFAULT_TIMEOUT_MINUTES,
            namespace: String::new(),
            worker_threads: DEFAULT_WORKER_THREADS,
        }
    }
}

impl CacheConfig {
    /// Parse from a JSON document. Missing fields keep their defaults.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` on malformed JSON or invalid values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: CacheConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `CACHE_PLEX_*` environment variables.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if a variable is set but does not parse.
    pub fn from_env() -> Result<Self> {
        let mut config = CacheConfig::default();

        if let Some(enabled) = env_var(ENV_ENABLED) {
            config.enabled = parse_env(ENV_ENABLED, &enabled)?;
        }
        if let Some(timeout) = env_var(ENV_DEFAULT_TIMEOUT) {
            config.default_timeout = parse_env(ENV_DEFAULT_TIMEOUT, &timeout)?;
        }
        if let Some(namespace) = env_var(ENV_NAMESPACE) {
            config.namespace = namespace;
        }
        if let Some(workers) = env_var(ENV_WORKERS) {
            config.worker_threads = parse_env(ENV_WORKERS, &workers)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Start the facade enabled or disabled.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Default time-to-live in minutes.
    pub fn with_default_timeout(mut self, minutes: i64) -> Self {
        self.default_timeout = minutes;
        self
    }

    /// Namespace mixed into every key the facade builds.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Size of the async worker pool.
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    /// # Errors
    /// Returns `Error::ConfigError` for a zero-sized worker pool.
    pub fn validate(&self) -> Result<()> {
        if self.worker_threads == 0 {
            return Err(Error::ConfigError(
                "worker_threads must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| Error::ConfigError(format!("{}='{}': {}", name, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.default_timeout, DEFAULT_TIMEOUT_MINUTES);
        assert!(config.namespace.is_empty());
        assert_eq!(config.worker_threads, DEFAULT_WORKER_THREADS);
    }

    #[test]
    fn test_from_json_partial() {
        let config = CacheConfig::from_json(r#"{"namespace": "shop", "enabled": false}"#)
            .expect("valid config");
        assert_eq!(config.namespace, "shop");
        assert!(!config.enabled);
        assert_eq!(config.default_timeout, DEFAULT_TIMEOUT_MINUTES);
    }

    #[test]
    fn test_from_json_rejects_zero_workers() {
        assert!(matches!(
            CacheConfig::from_json(r#"{"worker_threads": 0}"#),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn test_from_json_malformed() {
        assert!(matches!(
            CacheConfig::from_json("{not json"),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn test_parse_env_error_names_variable() {
        let err = parse_env::<i64>(ENV_DEFAULT_TIMEOUT, "soon").unwrap_err();
        assert!(err.to_string().contains(ENV_DEFAULT_TIMEOUT));
    }
}
