//! Cache provider capability and the built-in providers.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

pub mod local;

pub use local::{LocalConfig, LocalProvider, LocalStats, PurgePolicy, SweepReport};

/// Lifecycle of a provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderState {
    Uninitialized,
    Initialized,
}

/// Trait for cache provider implementations.
///
/// The facade stores providers as `Arc<dyn CacheProvider>` and only ever
/// dispatches through this trait. Out-of-process stores (a memcached binding,
/// a request-scoped web cache) plug in by implementing it and wrapping their
/// client failures in `Error::BackendError`.
///
/// **IMPORTANT:** All methods take `&self`. Implementations use interior
/// mutability so that one provider can serve many threads.
///
/// Values cross this boundary as opaque encoded bytes; expiry is always an
/// absolute UTC instant.
pub trait CacheProvider: Send + Sync {
    /// Stable identifier, unique within a registry.
    fn id(&self) -> Uuid;

    /// Display name, unique (case-insensitive) within a registry.
    fn name(&self) -> &str;

    /// Current lifecycle state.
    fn state(&self) -> ProviderState;

    /// Acquire resources. Calling it on an initialized provider does nothing.
    ///
    /// # Errors
    /// Returns `Err` if the underlying store cannot be brought up.
    fn initialize(&self) -> Result<()>;

    /// Release resources. Calling it on an uninitialized provider does nothing.
    ///
    /// # Errors
    /// Returns `Err` if resources cannot be released cleanly.
    fn uninitialize(&self) -> Result<()>;

    /// Retrieve the stored bytes for `key`.
    ///
    /// # Returns
    /// - `Ok(Some(bytes))` - Value found
    /// - `Ok(None)` - Key unknown
    ///
    /// # Errors
    /// Returns `Err` if a backend error occurs.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store bytes under `key` until `expires_at`, replacing any previous entry.
    ///
    /// # Errors
    /// Returns `Err` if a backend error occurs.
    fn set(&self, key: &str, value: Vec<u8>, expires_at: DateTime<Utc>) -> Result<()>;

    /// Remove `key`. Unknown keys are not an error.
    ///
    /// # Errors
    /// Returns `Err` if a backend error occurs.
    fn unset(&self, key: &str) -> Result<()>;

    /// Check whether `key` is present.
    ///
    /// # Errors
    /// Returns `Err` if a backend error occurs.
    fn exists(&self, key: &str) -> Result<bool>;

    /// Remove every entry.
    ///
    /// # Errors
    /// Returns `Err` if a backend error occurs.
    fn clear(&self) -> Result<()>;

    /// Remove every entry whose key starts with `prefix`.
    ///
    /// # Errors
    /// Returns `Err` if the operation is not supported or fails.
    fn clear_by_prefix(&self, prefix: &str) -> Result<()> {
        Err(Error::NotImplemented(format!(
            "clear_by_prefix('{}') not supported by provider '{}'",
            prefix,
            self.name()
        )))
    }
}

/// Name of the fallback provider.
pub const NULL_PROVIDER_NAME: &str = "null";

/// Provider that stores nothing.
///
/// Fills the default slot whenever no real provider is assigned, so reads
/// return a miss instead of failing.
#[derive(Debug, Default)]
pub struct NullProvider {
    initialized: AtomicBool,
}

impl NullProvider {
    /// A fresh, uninitialized null provider.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheProvider for NullProvider {
    fn id(&self) -> Uuid {
        Uuid::nil()
    }

    fn name(&self) -> &str {
        NULL_PROVIDER_NAME
    }

    fn state(&self) -> ProviderState {
        if self.initialized.load(Ordering::Acquire) {
            ProviderState::Initialized
        } else {
            ProviderState::Uninitialized
        }
    }

    fn initialize(&self) -> Result<()> {
        self.initialized.store(true, Ordering::Release);
        Ok(())
    }

    fn uninitialize(&self) -> Result<()> {
        self.initialized.store(false, Ordering::Release);
        Ok(())
    }

    fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: Vec<u8>, _expires_at: DateTime<Utc>) -> Result<()> {
        Ok(())
    }

    fn unset(&self, _key: &str) -> Result<()> {
        Ok(())
    }

    fn exists(&self, _key: &str) -> Result<bool> {
        Ok(false)
    }

    fn clear(&self) -> Result<()> {
        Ok(())
    }

    fn clear_by_prefix(&self, _prefix: &str) -> Result<()> {
        Ok(())
    }
}
