//! Value codec used by the facade before bytes reach a provider.
//!
//! Providers only ever see opaque byte sequences. Every stored value is
//! wrapped in a small versioned envelope and encoded with Postcard:
//!
//! ```text
//! ┌─────────────────┬─────────────────┬──────────────────────────┐
//! │  MAGIC (4 bytes)│ VERSION (varint)│ POSTCARD PAYLOAD (N bytes)│
//! └─────────────────┴─────────────────┴──────────────────────────┘
//!   "CPLX"              u32                 postcard::to_allocvec(T)
//! ```
//!
//! ```rust
//! use cache_plex::serialization::{decode_value, encode_value};
//!
//! # fn main() -> cache_plex::Result<()> {
//! let bytes = encode_value(&("Alice", 42u32))?;
//! let (name, age): (String, u32) = decode_value(&bytes)?;
//! assert_eq!(name, "Alice");
//! assert_eq!(age, 42);
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Header identifying bytes written by this crate.
pub const VALUE_MAGIC: [u8; 4] = *b"CPLX";

/// Envelope version. Bump when the envelope layout changes.
pub const ENVELOPE_VERSION: u32 = 1;

/// Versioned wrapper around every cached value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ValueEnvelope<T> {
    pub magic: [u8; 4],
    pub version: u32,
    pub payload: T,
}

impl<T> ValueEnvelope<T> {
    /// Wrap `payload` with the current magic and version.
    pub fn new(payload: T) -> Self {
        Self {
            magic: VALUE_MAGIC,
            version: ENVELOPE_VERSION,
            payload,
        }
    }
}

/// Encode a value for storage.
///
/// # Errors
///
/// Returns `Error::SerializationError` if the value's `Serialize` impl fails.
pub fn encode_value<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    postcard::to_allocvec(&ValueEnvelope::new(value)).map_err(|e| {
        error!("Cache value encoding failed: {}", e);
        Error::SerializationError(e.to_string())
    })
}

/// Decode bytes previously produced by [`encode_value`].
///
/// # Errors
///
/// - `Error::DeserializationError`: payload does not decode as `T`
/// - `Error::InvalidCacheEntry`: magic header mismatch
/// - `Error::VersionMismatch`: envelope written by another version
pub fn decode_value<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let envelope: ValueEnvelope<T> = postcard::from_bytes(bytes).map_err(|e| {
        error!("Cache value decoding failed: {}", e);
        Error::DeserializationError(e.to_string())
    })?;

    if envelope.magic != VALUE_MAGIC {
        warn!(
            "Invalid cache entry: expected magic {:?}, got {:?}",
            VALUE_MAGIC, envelope.magic
        );
        return Err(Error::InvalidCacheEntry(format!(
            "Invalid magic: expected {:?}, got {:?}",
            VALUE_MAGIC, envelope.magic
        )));
    }

    if envelope.version != ENVELOPE_VERSION {
        return Err(Error::VersionMismatch {
            expected: ENVELOPE_VERSION,
            found: envelope.version,
        });
    }

    Ok(envelope.payload)
}
