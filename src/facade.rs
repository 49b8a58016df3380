//! Cache facade - the single entry point for cache operations.
//!
//! [`Cache`] owns the provider registry and dispatches every operation to the
//! current default provider. It is an explicit context object: create one at
//! startup, clone it (cheap, shared `Arc`) into every call site, and call
//! [`Cache::shutdown`] at the end.

use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::{AsyncError, AsyncState, Error, Result};
use crate::key::CacheKeyBuilder;
use crate::provider::{CacheProvider, NullProvider};
use crate::serialization::{decode_value, encode_value};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Receives failures raised by async operations.
pub type AsyncErrorHandler = Arc<dyn Fn(&AsyncError) + Send + Sync>;

/// When a stored value expires.
///
/// Every variant is resolved to an absolute UTC instant before it reaches a
/// provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expiry {
    /// The facade's configured default timeout.
    Default,
    /// A number of minutes from now.
    Minutes(i64),
    /// A duration from now.
    After(Duration),
    /// An absolute instant.
    At(DateTime<Utc>),
}

impl Expiry {
    /// Absolute expiry instant relative to `now`.
    ///
    /// Out-of-range results saturate to the earliest or latest representable
    /// instant.
    pub fn resolve(&self, now: DateTime<Utc>, default_minutes: i64) -> DateTime<Utc> {
        match *self {
            Expiry::Default => add_minutes(now, default_minutes),
            Expiry::Minutes(minutes) => add_minutes(now, minutes),
            Expiry::After(duration) => chrono::Duration::from_std(duration)
                .ok()
                .and_then(|d| now.checked_add_signed(d))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            Expiry::At(at) => at,
        }
    }
}

/// Provider names compare equal under Unicode lowercasing.
fn names_match(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

fn add_minutes(now: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    chrono::Duration::try_minutes(minutes)
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(if minutes < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
}

impl From<Duration> for Expiry {
    fn from(duration: Duration) -> Self {
        Expiry::After(duration)
    }
}

impl From<DateTime<Utc>> for Expiry {
    fn from(at: DateTime<Utc>) -> Self {
        Expiry::At(at)
    }
}

struct FacadeState {
    enabled: bool,
    default_timeout: i64,
    namespace: String,
    providers: Vec<Arc<dyn CacheProvider>>,
    default: Arc<dyn CacheProvider>,
    error_handler: Option<AsyncErrorHandler>,
}

impl FacadeState {
    fn find(&self, id: Uuid) -> Option<usize> {
        self.providers.iter().position(|p| p.id() == id)
    }

    fn default_is_null(&self) -> bool {
        self.default.id() == NULL_ID
    }
}

const NULL_ID: Uuid = Uuid::nil();

struct CacheInner {
    state: Mutex<FacadeState>,
    null: Arc<dyn CacheProvider>,
    clock: Arc<dyn Clock>,
    workers: Handle,
    runtime: Mutex<Option<Runtime>>,
}

impl Drop for CacheInner {
    fn drop(&mut self) {
        let runtime = self
            .runtime
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(runtime) = runtime {
            runtime.shutdown_background();
        }
    }
}

/// Process-wide cache facade.
///
/// # Example
///
/// ```
/// use cache_plex::{Cache, CacheConfig, Expiry};
/// use cache_plex::provider::LocalProvider;
/// use std::sync::Arc;
///
/// # fn main() -> cache_plex::Result<()> {
/// let cache = Cache::new(CacheConfig::default())?;
/// cache.register_provider(Arc::new(LocalProvider::new()), true)?;
///
/// let key = cache.create_key(&"user:1");
/// cache.set(&key, "Alice", Expiry::Minutes(1))?;
/// assert_eq!(cache.get::<String>(&key)?, Some("Alice".to_string()));
///
/// cache.shutdown();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Cache {
    inner: Arc<CacheInner>,
}

impl Cache {
    /// Create a facade with `NullProvider` as its default.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` for invalid configuration, or
    /// `Error::BackendError` if the worker pool cannot be started.
    pub fn new(config: CacheConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a facade that resolves relative expiries against `clock`.
    ///
    /// # Errors
    /// Same as [`Cache::new`].
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(config.worker_threads)
            .thread_name("cache-plex-worker")
            .build()?;

        let null: Arc<dyn CacheProvider> = Arc::new(NullProvider::new());
        null.initialize()?;

        info!(
            "✓ Cache facade created (enabled: {}, timeout: {}m, namespace: '{}', workers: {})",
            config.enabled, config.default_timeout, config.namespace, config.worker_threads
        );

        Ok(Cache {
            inner: Arc::new(CacheInner {
                state: Mutex::new(FacadeState {
                    enabled: config.enabled,
                    default_timeout: config.default_timeout,
                    namespace: config.namespace,
                    providers: Vec::new(),
                    default: Arc::clone(&null),
                    error_handler: None,
                }),
                null,
                clock,
                workers: runtime.handle().clone(),
                runtime: Mutex::new(Some(runtime)),
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, FacadeState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ========================================================================
    // Registry
    // ========================================================================

    /// Add a provider to the registry and initialize it.
    ///
    /// The provider becomes the default when `make_default` is set or when the
    /// current default is the null provider.
    ///
    /// # Errors
    /// - `Error::ConfigError`: a provider with the same id or name
    ///   (case-insensitive) is already registered; the registry is unchanged
    /// - any error from the provider's `initialize`
    pub fn register_provider(
        &self,
        provider: Arc<dyn CacheProvider>,
        make_default: bool,
    ) -> Result<()> {
        let mut state = self.lock();

        let clash = state.providers.iter().find(|p| {
            p.id() == provider.id() || names_match(p.name(), provider.name())
        });
        if let Some(existing) = clash {
            return Err(Error::ConfigError(format!(
                "provider '{}' ({}) conflicts with registered provider '{}' ({})",
                provider.name(),
                provider.id(),
                existing.name(),
                existing.id()
            )));
        }
        if provider.id() == NULL_ID {
            return Err(Error::ConfigError(
                "the nil id is reserved for the null provider".to_string(),
            ));
        }

        provider.initialize()?;
        state.providers.push(Arc::clone(&provider));

        if make_default || state.default_is_null() {
            state.default = Arc::clone(&provider);
        }

        info!(
            "✓ Registered cache provider '{}' ({}){}",
            provider.name(),
            provider.id(),
            if state.default.id() == provider.id() {
                " as default"
            } else {
                ""
            }
        );
        Ok(())
    }

    /// Remove a provider from the registry and uninitialize it.
    ///
    /// Unknown providers are ignored. If the provider was the default, the
    /// null provider takes its place.
    ///
    /// # Errors
    /// Returns any error from the provider's `uninitialize`; the provider has
    /// already been removed by then.
    pub fn unregister_provider(&self, provider: &Arc<dyn CacheProvider>) -> Result<()> {
        let mut state = self.lock();

        let Some(index) = state.find(provider.id()) else {
            debug!("Unregister of unknown provider '{}' ignored", provider.name());
            return Ok(());
        };

        if state.default.id() == provider.id() {
            state.default = Arc::clone(&self.inner.null);
        }
        let removed = state.providers.remove(index);
        drop(state);

        info!("✓ Unregistered cache provider '{}'", removed.name());
        removed.uninitialize()
    }

    /// Registered providers, in registration order.
    pub fn providers(&self) -> Vec<Arc<dyn CacheProvider>> {
        self.lock().providers.clone()
    }

    /// Look up a registered provider by name (case-insensitive).
    pub fn provider_by_name(&self, name: &str) -> Option<Arc<dyn CacheProvider>> {
        self.lock()
            .providers
            .iter()
            .find(|p| names_match(p.name(), name))
            .cloned()
    }

    /// Look up a registered provider by id.
    pub fn provider_by_id(&self, id: Uuid) -> Option<Arc<dyn CacheProvider>> {
        let state = self.lock();
        state.find(id).map(|i| Arc::clone(&state.providers[i]))
    }

    /// The provider operations are dispatched to. Never empty: falls back to
    /// the null provider.
    pub fn default_provider(&self) -> Arc<dyn CacheProvider> {
        Arc::clone(&self.lock().default)
    }

    /// Change the default provider. `None` (or the null provider) selects the
    /// null provider.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if the provider is not registered.
    pub fn set_default_provider(&self, provider: Option<Arc<dyn CacheProvider>>) -> Result<()> {
        let mut state = self.lock();

        let next = match provider {
            None => Arc::clone(&self.inner.null),
            Some(p) if p.id() == NULL_ID => Arc::clone(&self.inner.null),
            Some(p) => match state.find(p.id()) {
                Some(index) => Arc::clone(&state.providers[index]),
                None => {
                    return Err(Error::ConfigError(format!(
                        "provider '{}' ({}) is not registered",
                        p.name(),
                        p.id()
                    )))
                }
            },
        };

        info!("✓ Default cache provider set to '{}'", next.name());
        state.default = next;
        Ok(())
    }

    /// The null provider shared by this facade.
    pub fn null_provider(&self) -> Arc<dyn CacheProvider> {
        Arc::clone(&self.inner.null)
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Whether operations reach the default provider.
    pub fn enabled(&self) -> bool {
        self.lock().enabled
    }

    /// When disabled, every operation becomes a silent no-op.
    pub fn set_enabled(&self, enabled: bool) {
        self.lock().enabled = enabled;
    }

    /// Default time-to-live in minutes.
    pub fn default_timeout(&self) -> i64 {
        self.lock().default_timeout
    }

    /// Change the time-to-live used by [`Expiry::Default`].
    pub fn set_default_timeout(&self, minutes: i64) {
        self.lock().default_timeout = minutes;
    }

    /// Namespace mixed into keys built by [`Cache::create_key`].
    pub fn namespace(&self) -> String {
        self.lock().namespace.clone()
    }

    /// Change the namespace for keys built after this call.
    pub fn set_namespace(&self, namespace: impl Into<String>) {
        self.lock().namespace = namespace.into();
    }

    /// Subscribe to failures of async operations. Replaces any previous
    /// handler.
    pub fn on_async_error<F>(&self, handler: F)
    where
        F: Fn(&AsyncError) + Send + Sync + 'static,
    {
        self.lock().error_handler = Some(Arc::new(handler));
    }

    /// Remove the async error handler. Later async failures panic on the
    /// worker thread.
    pub fn clear_async_error_handler(&self) {
        self.lock().error_handler = None;
    }

    // ========================================================================
    // Keys
    // ========================================================================

    /// Hashed key for a single value, within the current namespace.
    pub fn create_key(&self, value: &dyn Display) -> String {
        self.key_builder().key(value)
    }

    /// Hashed key for an ordered list of values, within the current namespace.
    pub fn create_compound_key(&self, values: &[Option<&dyn Display>]) -> String {
        self.key_builder().compound(values)
    }

    fn key_builder(&self) -> CacheKeyBuilder {
        CacheKeyBuilder::new(self.lock().namespace.clone())
    }

    // ========================================================================
    // Synchronous operations
    // ========================================================================

    /// Fetch and decode the value stored under `key`.
    ///
    /// Returns `Ok(None)` on a miss or when the facade is disabled.
    ///
    /// # Errors
    /// - `Error::DeserializationError`, `Error::InvalidCacheEntry`,
    ///   `Error::VersionMismatch`: stored bytes do not decode as `T`
    /// - `Error::BackendError`: the provider failed
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let state = self.lock();
        if !state.enabled {
            return Ok(None);
        }

        match state.default.get(key)? {
            Some(bytes) => decode_value(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Encode `value` and store it under `key`.
    ///
    /// # Errors
    /// - `Error::SerializationError`: `value` could not be encoded; any
    ///   existing entry is left untouched
    /// - `Error::BackendError`: the provider failed
    pub fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        expiry: impl Into<Expiry>,
    ) -> Result<()> {
        let state = self.lock();
        if !state.enabled {
            return Ok(());
        }

        let bytes = encode_value(value)?;
        let expires_at = expiry
            .into()
            .resolve(self.inner.clock.now(), state.default_timeout);
        state.default.set(key, bytes, expires_at)
    }

    /// Remove `key`.
    ///
    /// # Errors
    /// Returns `Error::BackendError` if the provider failed.
    pub fn unset(&self, key: &str) -> Result<()> {
        let state = self.lock();
        if !state.enabled {
            return Ok(());
        }
        state.default.unset(key)
    }

    /// Whether `key` is present. `false` when the facade is disabled.
    ///
    /// # Errors
    /// Returns `Error::BackendError` if the provider failed.
    pub fn exists(&self, key: &str) -> Result<bool> {
        let state = self.lock();
        if !state.enabled {
            return Ok(false);
        }
        state.default.exists(key)
    }

    /// Remove every entry from the default provider.
    ///
    /// # Errors
    /// Returns `Error::BackendError` if the provider failed.
    pub fn clear(&self) -> Result<()> {
        let state = self.lock();
        if !state.enabled {
            return Ok(());
        }
        warn!("⚠ CLEAR dispatched to provider '{}'", state.default.name());
        state.default.clear()
    }

    /// Remove every entry whose key starts with `prefix`.
    ///
    /// # Errors
    /// Returns `Error::NotImplemented` if the default provider cannot filter
    /// by prefix.
    pub fn clear_by_prefix(&self, prefix: &str) -> Result<()> {
        let state = self.lock();
        if !state.enabled {
            return Ok(());
        }
        state.default.clear_by_prefix(prefix)
    }

    // ========================================================================
    // Async operations
    // ========================================================================
    //
    // Each call runs its synchronous counterpart on the worker pool, then
    // invokes `callback` on that worker thread. Failures go to the
    // `on_async_error` handler; without one, the worker panics with the
    // original `Error`, which surfaces through the returned `JoinHandle`.
    // Nothing orders concurrent calls on the same key.

    /// Async [`Cache::get`]. `callback` receives the value and `state`.
    pub fn get_async<T, F>(
        &self,
        key: &str,
        state: Option<AsyncState>,
        callback: F,
    ) -> JoinHandle<()>
    where
        T: DeserializeOwned + Send + 'static,
        F: FnOnce(Option<T>, Option<AsyncState>) + Send + 'static,
    {
        let key = key.to_string();
        self.submit(Some(key.clone()), state, move |cache, state| {
            let value = cache.get::<T>(&key)?;
            callback(value, state);
            Ok(())
        })
    }

    /// Async [`Cache::set`]. `callback` receives `state` once stored.
    pub fn set_async<T, F>(
        &self,
        key: &str,
        value: T,
        expiry: impl Into<Expiry>,
        state: Option<AsyncState>,
        callback: F,
    ) -> JoinHandle<()>
    where
        T: Serialize + Send + 'static,
        F: FnOnce(Option<AsyncState>) + Send + 'static,
    {
        let key = key.to_string();
        let expiry = expiry.into();
        self.submit(Some(key.clone()), state, move |cache, state| {
            cache.set(&key, &value, expiry)?;
            callback(state);
            Ok(())
        })
    }

    /// Async [`Cache::unset`].
    pub fn unset_async<F>(&self, key: &str, state: Option<AsyncState>, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Option<AsyncState>) + Send + 'static,
    {
        let key = key.to_string();
        self.submit(Some(key.clone()), state, move |cache, state| {
            cache.unset(&key)?;
            callback(state);
            Ok(())
        })
    }

    /// Async [`Cache::exists`].
    pub fn exists_async<F>(&self, key: &str, state: Option<AsyncState>, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(bool, Option<AsyncState>) + Send + 'static,
    {
        let key = key.to_string();
        self.submit(Some(key.clone()), state, move |cache, state| {
            let present = cache.exists(&key)?;
            callback(present, state);
            Ok(())
        })
    }

    /// Async [`Cache::clear`].
    pub fn clear_async<F>(&self, state: Option<AsyncState>, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Option<AsyncState>) + Send + 'static,
    {
        self.submit(None, state, move |cache, state| {
            cache.clear()?;
            callback(state);
            Ok(())
        })
    }

    fn submit<F>(&self, key: Option<String>, state: Option<AsyncState>, unit: F) -> JoinHandle<()>
    where
        F: FnOnce(&Cache, Option<AsyncState>) -> Result<()> + Send + 'static,
    {
        let cache = self.clone();
        self.inner.workers.spawn_blocking(move || {
            if let Err(error) = unit(&cache, state.clone()) {
                cache.report_async_error(AsyncError::new(key, state, error));
            }
        })
    }

    fn report_async_error(&self, error: AsyncError) {
        let handler = self.lock().error_handler.clone();
        match handler {
            Some(handler) => {
                debug!("Async cache error delivered to handler: {}", error);
                handler(&error);
            }
            None => {
                error!("Unhandled async cache error: {}", error);
                std::panic::panic_any(error.into_error());
            }
        }
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Uninitialize and remove every provider, fall back to the null
    /// provider, and stop the worker pool without waiting for queued work.
    ///
    /// Safe to call more than once. Async calls made afterwards are
    /// cancelled.
    pub fn shutdown(&self) {
        let providers = {
            let mut state = self.lock();
            state.default = Arc::clone(&self.inner.null);
            std::mem::take(&mut state.providers)
        };

        for provider in providers {
            if let Err(e) = provider.uninitialize() {
                error!(
                    "Provider '{}' failed to uninitialize: {}",
                    provider.name(),
                    e
                );
            }
        }

        let runtime = self
            .inner
            .runtime
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(runtime) = runtime {
            runtime.shutdown_background();
            info!("✓ Cache facade shut down");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::provider::{LocalProvider, ProviderState};

    fn cache() -> Cache {
        Cache::new(CacheConfig::default()).expect("Failed to create cache")
    }

    fn local(name: &str) -> Arc<dyn CacheProvider> {
        Arc::new(LocalProvider::new().with_identity(Uuid::now_v7(), name))
    }

    #[test]
    fn test_expiry_resolution() {
        let now = Utc::now();
        assert_eq!(
            Expiry::Default.resolve(now, 10),
            now + chrono::Duration::minutes(10)
        );
        assert_eq!(
            Expiry::Minutes(2).resolve(now, 10),
            now + chrono::Duration::minutes(2)
        );
        assert_eq!(
            Expiry::After(Duration::from_secs(30)).resolve(now, 10),
            now + chrono::Duration::seconds(30)
        );
        assert_eq!(Expiry::At(now).resolve(now, 10), now);
    }

    #[test]
    fn test_expiry_saturates() {
        let now = Utc::now();
        assert_eq!(
            Expiry::Minutes(i64::MAX).resolve(now, 0),
            DateTime::<Utc>::MAX_UTC
        );
        assert_eq!(
            Expiry::After(Duration::MAX).resolve(now, 0),
            DateTime::<Utc>::MAX_UTC
        );
    }

    #[test]
    fn test_first_registration_becomes_default() {
        let cache = cache();
        assert_eq!(cache.default_provider().id(), NULL_ID);

        let provider = local("local");
        cache
            .register_provider(Arc::clone(&provider), false)
            .expect("register");

        assert_eq!(cache.default_provider().id(), provider.id());
        assert_eq!(provider.state(), ProviderState::Initialized);
    }

    #[test]
    fn test_second_registration_keeps_default_unless_asked() {
        let cache = cache();
        let first = local("first");
        let second = local("second");
        let third = local("third");

        cache.register_provider(Arc::clone(&first), false).expect("first");
        cache.register_provider(second, false).expect("second");
        assert_eq!(cache.default_provider().id(), first.id());

        cache.register_provider(Arc::clone(&third), true).expect("third");
        assert_eq!(cache.default_provider().id(), third.id());
        assert_eq!(cache.providers().len(), 3);
    }

    #[test]
    fn test_duplicate_name_rejected_case_insensitive() {
        let cache = cache();
        cache.register_provider(local("Local"), false).expect("register");

        let result = cache.register_provider(local("LOCAL"), true);
        assert!(matches!(result, Err(Error::ConfigError(_))));
        assert_eq!(cache.providers().len(), 1);
    }

    #[test]
    fn test_duplicate_name_rejected_beyond_ascii() {
        let cache = cache();
        cache.register_provider(local("Müller"), false).expect("register");

        let result = cache.register_provider(local("MÜLLER"), false);
        assert!(matches!(result, Err(Error::ConfigError(_))));
        assert_eq!(cache.providers().len(), 1);

        let found = cache.provider_by_name("mÜller").expect("lookup");
        assert_eq!(found.name(), "Müller");
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let cache = cache();
        let id = Uuid::now_v7();
        let a: Arc<dyn CacheProvider> = Arc::new(LocalProvider::new().with_identity(id, "a"));
        let b: Arc<dyn CacheProvider> = Arc::new(LocalProvider::new().with_identity(id, "b"));

        cache.register_provider(a, false).expect("register");
        assert!(matches!(
            cache.register_provider(b, false),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn test_unregister_default_falls_back_to_null() {
        let cache = cache();
        let provider = local("local");
        cache
            .register_provider(Arc::clone(&provider), true)
            .expect("register");
        cache.set("k", &1u32, Expiry::Default).expect("set");

        cache.unregister_provider(&provider).expect("unregister");

        assert_eq!(cache.default_provider().id(), NULL_ID);
        assert_eq!(provider.state(), ProviderState::Uninitialized);
        assert_eq!(cache.get::<u32>("k").expect("get"), None);
        assert!(!cache.exists("k").expect("exists"));
    }

    #[test]
    fn test_unregister_unknown_is_noop() {
        let cache = cache();
        cache
            .unregister_provider(&local("stranger"))
            .expect("unregister unknown");
    }

    #[test]
    fn test_set_default_provider() {
        let cache = cache();
        let a = local("a");
        let b = local("b");
        cache.register_provider(Arc::clone(&a), false).expect("a");
        cache.register_provider(Arc::clone(&b), false).expect("b");

        cache
            .set_default_provider(Some(Arc::clone(&b)))
            .expect("set default");
        assert_eq!(cache.default_provider().id(), b.id());

        assert!(matches!(
            cache.set_default_provider(Some(local("unregistered"))),
            Err(Error::ConfigError(_))
        ));
        assert_eq!(cache.default_provider().id(), b.id());

        cache.set_default_provider(None).expect("reset");
        assert_eq!(cache.default_provider().id(), NULL_ID);
    }

    #[test]
    fn test_provider_lookup() {
        let cache = cache();
        let provider = local("Primary");
        cache
            .register_provider(Arc::clone(&provider), false)
            .expect("register");

        assert!(cache.provider_by_name("primary").is_some());
        assert!(cache.provider_by_id(provider.id()).is_some());
        assert!(cache.provider_by_name("secondary").is_none());
    }

    #[test]
    fn test_disabled_facade_is_noop() {
        let cache = cache();
        cache.register_provider(local("local"), true).expect("register");
        cache.set("k", "v", Expiry::Default).expect("set");

        cache.set_enabled(false);
        assert_eq!(cache.get::<String>("k").expect("get"), None);
        assert!(!cache.exists("k").expect("exists"));
        cache.set("other", "v", Expiry::Default).expect("set");
        cache.unset("k").expect("unset");
        cache.clear().expect("clear");

        cache.set_enabled(true);
        assert_eq!(cache.get::<String>("k").expect("get"), Some("v".to_string()));
        assert!(!cache.exists("other").expect("exists"));
    }

    #[test]
    fn test_set_uses_default_timeout() {
        let clock = Arc::new(ManualClock::default());
        let cache = Cache::with_clock(CacheConfig::default().with_default_timeout(1), clock.clone())
            .expect("cache");
        let provider = Arc::new(LocalProvider::new().with_clock(clock.clone()));
        cache
            .register_provider(provider.clone(), true)
            .expect("register");

        cache.set("k", &7u8, Expiry::Default).expect("set");
        clock.advance(chrono::Duration::seconds(59));
        provider.sweep().expect("sweep");
        assert!(cache.exists("k").expect("exists"));

        clock.advance(chrono::Duration::seconds(2));
        provider.sweep().expect("sweep");
        assert!(!cache.exists("k").expect("exists"));
    }

    #[test]
    fn test_namespace_changes_keys() {
        let cache = cache();
        let bare = cache.create_compound_key(&[Some(&"a"), Some(&1)]);
        cache.set_namespace("tenant");
        let scoped = cache.create_compound_key(&[Some(&"a"), Some(&1)]);

        assert_ne!(bare, scoped);
        assert_eq!(cache.namespace(), "tenant");
        assert_eq!(scoped, CacheKeyBuilder::new("tenant").compound(&[Some(&"a"), Some(&1)]));
    }

    #[test]
    fn test_shutdown_uninitializes_providers() {
        let cache = cache();
        let provider = local("local");
        cache
            .register_provider(Arc::clone(&provider), true)
            .expect("register");

        cache.shutdown();
        cache.shutdown();

        assert!(cache.providers().is_empty());
        assert_eq!(cache.default_provider().id(), NULL_ID);
        assert_eq!(provider.state(), ProviderState::Uninitialized);
    }
}
