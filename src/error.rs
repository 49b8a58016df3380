//! Error types for the cache facade and its providers.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Underlying failure carried by `Error::BackendError`.
pub type BackendCause = Arc<dyn std::error::Error + Send + Sync>;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Caller-supplied state threaded through an async operation.
///
/// Handed back to the completion callback and attached to any [`AsyncError`].
pub type AsyncState = Arc<dyn Any + Send + Sync>;

/// Error types for the cache facade.
///
/// Synchronous operations return these directly. Operations submitted to the
/// worker pool report them wrapped in an [`AsyncError`].
#[derive(Debug, Clone)]
pub enum Error {
    /// Provider registration or default-provider assignment was rejected.
    ///
    /// Common causes:
    /// - A provider with the same id is already registered
    /// - A provider with the same name (case-insensitive) is already registered
    /// - The requested default provider is not registered
    /// - Invalid configuration values
    ConfigError(String),

    /// A value could not be encoded into cache bytes.
    SerializationError(String),

    /// Cached bytes could not be decoded into the requested type.
    ///
    /// **Recovery:** Unset the key and store the value again.
    DeserializationError(String),

    /// Cached bytes do not carry the expected envelope header.
    InvalidCacheEntry(String),

    /// The cached entry was written with a different schema version.
    VersionMismatch {
        /// Expected schema version (from compiled code)
        expected: u32,
        /// Found schema version (from cached entry)
        found: u32,
    },

    /// A provider's underlying store failed.
    ///
    /// External adapters wrap their client's error as `cause`; it is
    /// returned from `source()`.
    BackendError {
        message: String,
        cause: Option<BackendCause>,
    },

    /// The provider does not support the requested operation.
    NotImplemented(String),

    /// Generic error with custom message.
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::InvalidCacheEntry(msg) => write!(f, "Invalid cache entry: {}", msg),
            Error::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Cache version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            Error::BackendError { message, .. } => write!(f, "Backend error: {}", message),
            Error::NotImplemented(msg) => write!(f, "Not implemented: {}", msg),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::BackendError {
                cause: Some(cause), ..
            } => Some(cause.as_ref()),
            _ => None,
        }
    }
}

impl Error {
    /// Wrap an underlying failure of an external store, keeping it as the
    /// error's source.
    pub fn backend<E>(context: &str, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::BackendError {
            message: format!("{}: {}", context, cause),
            cause: Some(Arc::new(cause)),
        }
    }

    /// A backend failure with no underlying error value.
    pub fn backend_message(message: impl Into<String>) -> Self {
        Error::BackendError {
            message: message.into(),
            cause: None,
        }
    }
}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::backend("json io", e)
        } else {
            Error::ConfigError(e.to_string())
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::backend("io", e)
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Error::Other(format!("lock poisoned: {}", e))
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}

/// Failure raised inside an operation running on the worker pool.
///
/// Carries the key the operation targeted (if any) and the caller's state
/// alongside the original error.
#[derive(Clone)]
pub struct AsyncError {
    key: Option<String>,
    state: Option<AsyncState>,
    error: Error,
}

impl AsyncError {
    pub(crate) fn new(key: Option<String>, state: Option<AsyncState>, error: Error) -> Self {
        AsyncError { key, state, error }
    }

    /// Key of the failed operation. `None` for `clear`.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// State passed by the caller when the operation was submitted.
    pub fn state(&self) -> Option<&AsyncState> {
        self.state.as_ref()
    }

    /// The original error.
    pub fn error(&self) -> &Error {
        &self.error
    }

    /// Take the original error.
    pub fn into_error(self) -> Error {
        self.error
    }
}

impl fmt::Debug for AsyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncError")
            .field("key", &self.key)
            .field("has_state", &self.state.is_some())
            .field("error", &self.error)
            .finish()
    }
}

impl fmt::Display for AsyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "Async cache operation on '{}' failed: {}", key, self.error),
            None => write!(f, "Async cache operation failed: {}", self.error),
        }
    }
}

impl std::error::Error for AsyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
