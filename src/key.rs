//! Cache key construction.
//!
//! Keys are built by writing the namespace, then the string form of each
//! component followed by a terminator, and reducing the result to a SHA-256
//! hex digest. The digest has a
//! fixed length whatever the inputs, so no backend key-length limit can be hit.

use sha2::{Digest, Sha256};
use std::fmt::Display;

/// Terminator written after every key component.
pub const KEY_DELIMITER: char = ':';

/// Separates a non-empty namespace from the components.
pub const NAMESPACE_DELIMITER: char = '|';

/// Stands in for an absent component. Never produced by an escaped component.
pub const NULL_MARKER: &str = "\\0";

/// Length of every key produced by [`CacheKeyBuilder`].
pub const KEY_LENGTH: usize = 64;

/// Builder for namespaced, hashed cache keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheKeyBuilder {
    namespace: String,
}

impl CacheKeyBuilder {
    /// Builder whose keys are scoped to `namespace`. Empty means unscoped.
    pub fn new(namespace: impl Into<String>) -> Self {
        CacheKeyBuilder {
            namespace: namespace.into(),
        }
    }

    /// Namespace keys are scoped to.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Key for a single value.
    pub fn key(&self, value: &dyn Display) -> String {
        self.compound(&[Some(value)])
    }

    /// Key for an ordered list of values. `None` components are allowed.
    ///
    /// ```
    /// use cache_plex::key::{CacheKeyBuilder, KEY_LENGTH};
    ///
    /// let keys = CacheKeyBuilder::new("app");
    /// let a = keys.compound(&[Some(&"user"), Some(&42)]);
    /// let b = keys.compound(&[Some(&42), Some(&"user")]);
    /// assert_ne!(a, b);
    /// assert_eq!(a.len(), KEY_LENGTH);
    /// ```
    pub fn compound(&self, parts: &[Option<&dyn Display>]) -> String {
        let joined = self.build_composite(parts);
        Self::digest(&joined)
    }

    /// The pre-hash form of a compound key.
    ///
    /// A non-empty namespace is written first and closed by
    /// [`NAMESPACE_DELIMITER`]. Every component is then written escaped and
    /// closed by [`KEY_DELIMITER`], so the component count is part of the
    /// key. Neither delimiter appears unescaped inside a name or component.
    pub fn build_composite(&self, parts: &[Option<&dyn Display>]) -> String {
        let mut joined = String::new();

        if !self.namespace.is_empty() {
            push_escaped(&mut joined, &self.namespace);
            joined.push(NAMESPACE_DELIMITER);
        }

        for part in parts {
            match part {
                Some(value) => push_escaped(&mut joined, &value.to_string()),
                None => joined.push_str(NULL_MARKER),
            }
            joined.push(KEY_DELIMITER);
        }

        joined
    }

    /// Lower-case hex SHA-256 of `raw`.
    pub fn digest(raw: &str) -> String {
        hex::encode(Sha256::digest(raw.as_bytes()))
    }
}

// Escaping keeps ("a:b") and ("a", "b") apart, and a namespace apart from
// a component.
fn push_escaped(out: &mut String, value: &str) {
    for c in value.chars() {
        if c == '\\' || c == KEY_DELIMITER || c == NAMESPACE_DELIMITER {
            out.push('\\');
        }
        out.push(c);
    }
}
