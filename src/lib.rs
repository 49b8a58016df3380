//! # cache-plex
//!
//! A pluggable cache facade: one context object multiplexing operations to
//! interchangeable cache providers, plus a self-sweeping in-process provider.
//!
//! ## Features
//!
//! - **Swappable providers:** Anything implementing [`CacheProvider`] can be
//!   registered; one of them is the default that operations go to
//! - **Never without a default:** A no-op null provider fills the slot when
//!   nothing else is assigned
//! - **Bounded in-memory store:** [`LocalProvider`] expires entries and enforces
//!   a memory ceiling from a background sweeper
//! - **Async dispatch:** Every operation has a worker-pool counterpart with a
//!   completion callback and a dedicated error channel
//! - **Fixed-length keys:** Compound keys are hashed to a SHA-256 hex digest
//!
//! ## Quick Start
//!
//! ```
//! use cache_plex::{Cache, CacheConfig, Expiry};
//! use cache_plex::provider::{LocalConfig, LocalProvider, PurgePolicy};
//! use std::sync::Arc;
//!
//! # fn main() -> cache_plex::Result<()> {
//! // 1. Create the facade once, at startup
//! let cache = Cache::new(CacheConfig::default().with_namespace("shop"))?;
//!
//! // 2. Register a provider (the first one becomes the default)
//! let local = LocalProvider::with_config(
//!     LocalConfig::default()
//!         .with_max_memory(64 * 1024 * 1024)
//!         .with_purge_policy(PurgePolicy::LeastRecentlyUsed),
//! );
//! cache.register_provider(Arc::new(local), false)?;
//!
//! // 3. Use it - Cache is Clone for sharing across threads
//! let key = cache.create_compound_key(&[Some(&"user"), Some(&1)]);
//! cache.set(&key, "Alice", Expiry::Minutes(1))?;
//! assert_eq!(cache.get::<String>(&key)?, Some("Alice".to_string()));
//!
//! // 4. Tear down explicitly
//! cache.shutdown();
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate log;

pub mod clock;
pub mod config;
pub mod error;
pub mod facade;
pub mod key;
pub mod provider;
pub mod serialization;

// Re-exports for convenience
pub use config::CacheConfig;
pub use error::{AsyncError, AsyncState, Error, Result};
pub use facade::{AsyncErrorHandler, Cache, Expiry};
pub use key::CacheKeyBuilder;
pub use provider::{CacheProvider, LocalProvider, NullProvider, ProviderState, PurgePolicy};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
