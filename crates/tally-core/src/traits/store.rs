//! Durable classifier storage: alias→canonical associations plus
//! serialized weights and readiness bookkeeping, keyed by canonical
//! identity.
//!
//! Exactly one conforming implementation exists (the SQLite store) and is
//! selected at engine construction; there is no runtime backend switching.
//! Every operation commits on its own, so a crash between two related
//! calls leaves one of them fully applied rather than a torn mix.

use crate::errors::StorageError;
use crate::identity::RecordId;

/// Classifier state as it exists on disk, before deserialization into a
/// live scorer.
#[derive(Debug, Clone)]
pub struct StoredClassifier {
    /// Serialized scorer weights.
    pub weights: Vec<u8>,
    pub accept_ready: bool,
    pub reject_ready: bool,
    /// Distinct record identities the classifier has accepted.
    pub accepted: Vec<RecordId>,
}

pub trait ClassifierStore {
    /// True iff `id` has a recorded association, canonical or alias.
    fn have(&self, id: &RecordId) -> Result<bool, StorageError>;

    /// Resolve an identity to the canonical identity it is associated
    /// with. Fails with [`StorageError::NotFound`] for unassociated ids.
    fn canonical(&self, id: &RecordId) -> Result<RecordId, StorageError>;

    /// Fetch stored classifier state. `id` may be an alias; it is
    /// resolved to its canonical identity first when associated. `None`
    /// means no weights have ever been stored, and the caller constructs
    /// a fresh untrained classifier.
    fn load(&self, id: &RecordId) -> Result<Option<StoredClassifier>, StorageError>;

    /// Upsert serialized weights and readiness flags for a canonical
    /// identity. The first insert also records the reflexive association
    /// `(id, id)` in the same transaction.
    fn store(
        &self,
        id: &RecordId,
        weights: &[u8],
        accept_ready: bool,
        reject_ready: bool,
    ) -> Result<(), StorageError>;

    /// Update readiness flags and the accepted-identity set. Fails with
    /// [`StorageError::UnknownCluster`] when no weights row exists yet.
    fn store_metadata(
        &self,
        id: &RecordId,
        accept_ready: bool,
        reject_ready: bool,
        accepted: &[RecordId],
    ) -> Result<(), StorageError>;

    /// Record that `alias` belongs to the cluster stored under
    /// `canonical`. Re-recording the same mapping is a no-op; mapping an
    /// alias to a *different* canonical identity fails with
    /// [`StorageError::AssociationConflict`] rather than silently
    /// overwriting.
    fn associate(&self, canonical: &RecordId, alias: &RecordId) -> Result<(), StorageError>;
}
