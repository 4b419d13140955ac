//! Content-derived record identity.
//!
//! Two records with identical description text always share an identity,
//! independent of where the text came from. The digest is salted so that
//! identities are specific to this system and cannot collide with plain
//! content hashes of the same strings elsewhere in a database.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fixed salt mixed into every identity digest.
const IDENTITY_SALT: &[u8] = b"382a55c995b1e53f3ad0a3ed1c5ae735b9c7adc0";

/// Stable, content-derived identifier for a record's description text.
///
/// This is never a substitute for cluster identity: a cluster is keyed by
/// the identity of its *seed* record (the canonical identity), and other
/// record identities are associated with it through the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Derive the identity of a description.
    pub fn derive(description: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(description.as_bytes());
        hasher.update(IDENTITY_SALT);
        Self(hasher.finalize().to_hex().to_string())
    }

    /// Wrap an identity previously produced by [`RecordId::derive`] and
    /// read back from storage.
    pub fn from_stored(hex: String) -> Self {
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Seed value for deterministic pseudo-random decisions tied to this
    /// identity (weight initialization, pool shuffling).
    pub fn seed(&self) -> u64 {
        let mut bytes = [0u8; 8];
        for (i, b) in self.0.as_bytes().iter().take(8).enumerate() {
            bytes[i] = *b;
        }
        u64::from_le_bytes(bytes)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_shares_identity() {
        assert_eq!(RecordId::derive("WOOLWORTHS 123"), RecordId::derive("WOOLWORTHS 123"));
    }

    #[test]
    fn distinct_text_distinct_identity() {
        assert_ne!(RecordId::derive("WOOLWORTHS 123"), RecordId::derive("WOOLWORTHS 456"));
    }

    #[test]
    fn identity_survives_storage_round_trip() {
        let id = RecordId::derive("RENT PAYMENT");
        let restored = RecordId::from_stored(id.as_str().to_string());
        assert_eq!(id, restored);
    }

    #[test]
    fn seed_is_stable() {
        let id = RecordId::derive("GROCERY");
        assert_eq!(id.seed(), RecordId::derive("GROCERY").seed());
    }
}
