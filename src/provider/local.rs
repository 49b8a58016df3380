//! In-process cache provider (reference implementation).
//!
//! Entries live in a `HashMap` behind one store lock. Nothing is checked on
//! access; instead a background sweeper wakes every `sweep_interval` and, under
//! the same lock:
//!
//! 1. evicts entries chosen by the [`PurgePolicy`] while the stored bytes
//!    exceed `max_memory`,
//! 2. evicts every entry whose expiry instant is at or before now.
//!
//! Between passes an expired entry may still be reported by `exists`/`get`.
//! That window is bounded by one sweep interval.

use super::{CacheProvider, ProviderState};
use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use uuid::Uuid;

/// Default display name of a local provider.
pub const LOCAL_PROVIDER_NAME: &str = "local";

/// Default memory ceiling: 100 MiB of stored value bytes.
pub const DEFAULT_MAX_MEMORY: u64 = 100 * 1024 * 1024;

/// Default pause between sweep passes.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Shortest pause the sweeper accepts. Smaller intervals are raised to it.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Rule for picking an eviction victim when over the memory ceiling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurgePolicy {
    /// Earliest `created_at` first.
    #[default]
    Oldest,
    /// Largest stored value first.
    Largest,
    /// Earliest `accessed_at` first.
    LeastRecentlyUsed,
}

/// Configuration for [`LocalProvider`].
///
/// ```
/// use cache_plex::provider::{LocalConfig, PurgePolicy};
///
/// let config = LocalConfig::from_json(r#"{"max_memory": 1000, "purge_policy": "largest"}"#)
///     .expect("valid config");
/// assert_eq!(config.max_memory, 1000);
/// assert_eq!(config.purge_policy, PurgePolicy::Largest);
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    pub max_memory: u64,
    pub purge_policy: PurgePolicy,
    pub sweep_interval_ms: u64,
}

impl Default for LocalConfig {
    fn default() -> Self {
        LocalConfig {
            max_memory: DEFAULT_MAX_MEMORY,
            purge_policy: PurgePolicy::default(),
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL.as_millis() as u64,
        }
    }
}

impl LocalConfig {
    /// Parse from a JSON document. Missing fields keep their defaults.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` on malformed JSON or a zero sweep interval.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LocalConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Memory ceiling in bytes of stored values.
    pub fn with_max_memory(mut self, bytes: u64) -> Self {
        self.max_memory = bytes;
        self
    }

    /// Victim selection used while over the ceiling.
    pub fn with_purge_policy(mut self, policy: PurgePolicy) -> Self {
        self.purge_policy = policy;
        self
    }

    /// Set the pause between sweep passes, rounded up to whole milliseconds
    /// and never below [`MIN_SWEEP_INTERVAL`].
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        let millis = interval.as_nanos().div_ceil(1_000_000);
        self.sweep_interval_ms = u64::try_from(millis)
            .unwrap_or(u64::MAX)
            .max(MIN_SWEEP_INTERVAL.as_millis() as u64);
        self
    }

    /// Effective pause between sweep passes, never below [`MIN_SWEEP_INTERVAL`].
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms).max(MIN_SWEEP_INTERVAL)
    }

    fn validate(&self) -> Result<()> {
        if self.sweep_interval_ms == 0 {
            return Err(Error::ConfigError(
                "sweep_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

struct CacheEntry {
    data: Vec<u8>,
    created_at: DateTime<Utc>,
    accessed_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

struct Store {
    entries: HashMap<String, CacheEntry>,
    total_bytes: u64,
    max_memory: u64,
    purge_policy: PurgePolicy,
}

impl Store {
    fn new(config: &LocalConfig) -> Self {
        Store {
            entries: HashMap::new(),
            total_bytes: 0,
            max_memory: config.max_memory,
            purge_policy: config.purge_policy,
        }
    }

    fn insert(&mut self, key: String, entry: CacheEntry) {
        self.remove(&key);
        self.total_bytes += entry.size();
        self.entries.insert(key, entry);
    }

    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.total_bytes -= entry.size();
        Some(entry)
    }

    fn select_victim(&self) -> Option<String> {
        // min_by_key keeps the first of equal candidates, so ties go to
        // iteration order.
        let victim = match self.purge_policy {
            PurgePolicy::Oldest => self.entries.iter().min_by_key(|(_, e)| e.created_at),
            PurgePolicy::Largest => self.entries.iter().min_by_key(|(_, e)| Reverse(e.size())),
            PurgePolicy::LeastRecentlyUsed => {
                self.entries.iter().min_by_key(|(_, e)| e.accessed_at)
            }
        };
        victim.map(|(key, _)| key.clone())
    }

    fn sweep(&mut self, now: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport::default();

        while self.total_bytes > self.max_memory {
            let Some(victim) = self.select_victim() else {
                break;
            };
            self.remove(&victim);
            report.evicted_for_memory += 1;
        }

        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, e)| e.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            self.remove(key);
        }
        report.evicted_expired = expired.len();

        report
    }
}

fn lock_store(store: &Mutex<Store>) -> Result<MutexGuard<'_, Store>> {
    Ok(store.lock()?)
}

/// Outcome of one sweep pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub evicted_for_memory: usize,
    pub evicted_expired: usize,
}

/// Snapshot of a local provider's store.
#[derive(Clone, Debug)]
pub struct LocalStats {
    pub entries: usize,
    pub expired_entries: usize,
    pub total_bytes: u64,
    pub max_memory: u64,
}

struct Sweeper {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

/// Thread-safe in-process cache provider with a background sweeper.
///
/// # Example
///
/// ```
/// use cache_plex::provider::{CacheProvider, LocalProvider};
/// use chrono::{Duration, Utc};
///
/// # fn main() -> cache_plex::Result<()> {
/// let provider = LocalProvider::new();
/// provider.initialize()?;
///
/// provider.set("key1", b"value".to_vec(), Utc::now() + Duration::minutes(5))?;
/// assert_eq!(provider.get("key1")?, Some(b"value".to_vec()));
///
/// provider.uninitialize()?;
/// # Ok(())
/// # }
/// ```
pub struct LocalProvider {
    id: Uuid,
    name: String,
    store: Arc<Mutex<Store>>,
    clock: Arc<dyn Clock>,
    sweep_interval: Duration,
    sweeper: Mutex<Option<Sweeper>>,
}

impl LocalProvider {
    /// Create a provider with the default configuration.
    pub fn new() -> Self {
        Self::with_config(LocalConfig::default())
    }

    /// Create a provider from `config`. The sweeper starts on `initialize`.
    pub fn with_config(config: LocalConfig) -> Self {
        LocalProvider {
            id: Uuid::now_v7(),
            name: LOCAL_PROVIDER_NAME.to_string(),
            store: Arc::new(Mutex::new(Store::new(&config))),
            clock: Arc::new(SystemClock),
            sweep_interval: config.sweep_interval(),
            sweeper: Mutex::new(None),
        }
    }

    /// Replace the generated id and default name.
    pub fn with_identity(mut self, id: Uuid, name: impl Into<String>) -> Self {
        self.id = id;
        self.name = name.into();
        self
    }

    /// Use `clock` for timestamps and sweeping.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Current memory ceiling.
    pub fn max_memory(&self) -> Result<u64> {
        Ok(lock_store(&self.store)?.max_memory)
    }

    /// Change the memory ceiling. Takes effect on the next sweep.
    pub fn set_max_memory(&self, bytes: u64) -> Result<()> {
        lock_store(&self.store)?.max_memory = bytes;
        Ok(())
    }

    /// Current purge policy.
    pub fn purge_policy(&self) -> Result<PurgePolicy> {
        Ok(lock_store(&self.store)?.purge_policy)
    }

    /// Change the purge policy. Takes effect on the next sweep.
    pub fn set_purge_policy(&self, policy: PurgePolicy) -> Result<()> {
        lock_store(&self.store)?.purge_policy = policy;
        Ok(())
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> Result<usize> {
        Ok(lock_store(&self.store)?.entries.len())
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Snapshot of entry counts and memory use.
    pub fn stats(&self) -> Result<LocalStats> {
        let now = self.clock.now();
        let store = lock_store(&self.store)?;
        Ok(LocalStats {
            entries: store.entries.len(),
            expired_entries: store.entries.values().filter(|e| e.is_expired(now)).count(),
            total_bytes: store.total_bytes,
            max_memory: store.max_memory,
        })
    }

    /// Print store statistics to the debug log.
    pub fn log_stats(&self) -> Result<()> {
        let stats = self.stats()?;
        debug!(
            "Local '{}' stats: {} entries ({} expired), {}/{} bytes",
            self.name, stats.entries, stats.expired_entries, stats.total_bytes, stats.max_memory
        );
        Ok(())
    }

    /// Run one sweep pass now, using the provider's clock.
    pub fn sweep(&self) -> Result<SweepReport> {
        self.sweep_at(self.clock.now())
    }

    /// Run one sweep pass treating `now` as the current instant.
    pub fn sweep_at(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let report = lock_store(&self.store)?.sweep(now);
        log_report(&self.name, &report);
        Ok(report)
    }

    fn spawn_sweeper(&self) -> Result<Sweeper> {
        let (stop, stopped) = mpsc::channel::<()>();
        let store = Arc::clone(&self.store);
        let clock = Arc::clone(&self.clock);
        let interval = self.sweep_interval;
        let name = self.name.clone();

        let handle = thread::Builder::new()
            .name(format!("cache-sweep-{}", self.name))
            .spawn(move || loop {
                match stopped.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }

                let now = clock.now();
                match store.lock() {
                    Ok(mut store) => {
                        let report = store.sweep(now);
                        drop(store);
                        log_report(&name, &report);
                    }
                    Err(e) => {
                        error!("Local '{}' sweeper stopping: {}", name, e);
                        break;
                    }
                }
            })?;

        Ok(Sweeper { stop, handle })
    }
}

fn log_report(name: &str, report: &SweepReport) {
    if report.evicted_for_memory > 0 {
        warn!(
            "⚠ Local '{}' over memory limit: evicted {} entries",
            name, report.evicted_for_memory
        );
    }
    if report.evicted_expired > 0 {
        debug!(
            "✓ Local '{}' swept {} expired entries",
            name, report.evicted_expired
        );
    }
}

impl Default for LocalProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LocalProvider {
    fn drop(&mut self) {
        if let Err(e) = self.uninitialize() {
            error!("Local '{}' failed to stop sweeper: {}", self.name, e);
        }
    }
}

impl CacheProvider for LocalProvider {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> ProviderState {
        match self.sweeper.lock() {
            Ok(sweeper) if sweeper.is_some() => ProviderState::Initialized,
            _ => ProviderState::Uninitialized,
        }
    }

    fn initialize(&self) -> Result<()> {
        let mut sweeper = self.sweeper.lock()?;
        if sweeper.is_some() {
            return Ok(());
        }

        *sweeper = Some(self.spawn_sweeper()?);
        info!(
            "✓ Local '{}' initialized (sweep every {:?})",
            self.name, self.sweep_interval
        );
        Ok(())
    }

    fn uninitialize(&self) -> Result<()> {
        let Some(sweeper) = self.sweeper.lock()?.take() else {
            return Ok(());
        };

        // The sweeper may already be gone if it hit a poisoned lock.
        let _ = sweeper.stop.send(());
        sweeper
            .handle
            .join()
            .map_err(|_| Error::Other(format!("sweeper for '{}' panicked", self.name)))?;

        info!("✓ Local '{}' uninitialized", self.name);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = self.clock.now();
        let mut store = lock_store(&self.store)?;

        match store.entries.get_mut(key) {
            Some(entry) => {
                entry.accessed_at = now;
                debug!("✓ Local GET {} -> HIT", key);
                Ok(Some(entry.data.clone()))
            }
            None => {
                debug!("✓ Local GET {} -> MISS", key);
                Ok(None)
            }
        }
    }

    fn set(&self, key: &str, value: Vec<u8>, expires_at: DateTime<Utc>) -> Result<()> {
        let now = self.clock.now();
        let entry = CacheEntry {
            data: value,
            created_at: now,
            accessed_at: now,
            expires_at,
        };

        lock_store(&self.store)?.insert(key.to_string(), entry);
        debug!("✓ Local SET {} (expires: {})", key, expires_at);
        Ok(())
    }

    fn unset(&self, key: &str) -> Result<()> {
        lock_store(&self.store)?.remove(key);
        debug!("✓ Local UNSET {}", key);
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(lock_store(&self.store)?.entries.contains_key(key))
    }

    fn clear(&self) -> Result<()> {
        let mut store = lock_store(&self.store)?;
        store.entries.clear();
        store.total_bytes = 0;
        warn!("⚠ Local '{}' CLEAR executed - all entries removed", self.name);
        Ok(())
    }

    fn clear_by_prefix(&self, prefix: &str) -> Result<()> {
        let mut store = lock_store(&self.store)?;
        let doomed: Vec<String> = store
            .entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        for key in &doomed {
            store.remove(key);
        }
        debug!(
            "✓ Local CLEAR prefix '{}' removed {} entries",
            prefix,
            doomed.len()
        );
        Ok(())
    }
}
