/// Persistence-layer errors for the classifier store.
///
/// `NotFound` is the only recoverable variant: it means an identity has no
/// recorded association yet and the caller is expected to create fresh
/// state. The remaining variants indicate corrupted persisted state or a
/// broken invariant and must propagate to the session boundary unretried.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("no association recorded for identity {id}")]
    NotFound { id: String },

    #[error("metadata write for cluster {id} which has no stored weights")]
    UnknownCluster { id: String },

    #[error("alias {alias} already associated with {existing}, refusing to remap to {requested}")]
    AssociationConflict {
        alias: String,
        existing: String,
        requested: String,
    },

    #[error("SQLite error: {message}")]
    Sqlite { message: String },

    #[error("classifier state serialization failed: {message}")]
    Serialize { message: String },
}

impl StorageError {
    /// True for the one expected, recoverable outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
