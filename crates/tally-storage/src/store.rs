//! `SqliteStore` — the conforming [`ClassifierStore`] implementation.

use std::path::Path;

use rusqlite::Connection;
use tracing::debug;

use tally_core::errors::StorageError;
use tally_core::identity::RecordId;
use tally_core::traits::{ClassifierStore, StoredClassifier};

use crate::queries::{assoc, classifiers};
use crate::{connection, to_sql_err};

/// Owns the session's single connection. Operations auto-commit; the
/// connection closes when the store is dropped at session end.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a file-backed store, creating the schema on first use.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Ok(Self {
            conn: connection::open(path)?,
        })
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Self {
            conn: connection::open_in_memory()?,
        })
    }

    /// All aliases a cluster owns, canonical identity included.
    pub fn aliases_of(&self, canonical: &RecordId) -> Result<Vec<RecordId>, StorageError> {
        assoc::aliases_of(&self.conn, canonical)
    }
}

impl ClassifierStore for SqliteStore {
    fn have(&self, id: &RecordId) -> Result<bool, StorageError> {
        assoc::exists(&self.conn, id)
    }

    fn canonical(&self, id: &RecordId) -> Result<RecordId, StorageError> {
        assoc::lookup(&self.conn, id)?.ok_or_else(|| StorageError::NotFound {
            id: id.to_string(),
        })
    }

    fn load(&self, id: &RecordId) -> Result<Option<StoredClassifier>, StorageError> {
        // An alias resolves to its canonical identity first; an
        // unassociated identity can only have weights under itself.
        let canonical = match assoc::lookup(&self.conn, id)? {
            Some(canonical) => canonical,
            None => id.clone(),
        };
        classifiers::get(&self.conn, &canonical)
    }

    fn store(
        &self,
        id: &RecordId,
        weights: &[u8],
        accept_ready: bool,
        reject_ready: bool,
    ) -> Result<(), StorageError> {
        // Weights upsert and the reflexive association are one atomic
        // step: a crash leaves either both or neither.
        let tx = self.conn.unchecked_transaction().map_err(to_sql_err)?;
        let first_insert = !classifiers::exists(&tx, id)?;
        classifiers::upsert(&tx, id, weights, accept_ready, reject_ready)?;
        if first_insert && !assoc::exists(&tx, id)? {
            assoc::insert(&tx, id, id)?;
        }
        tx.commit().map_err(to_sql_err)?;
        if first_insert {
            debug!(canonical = %id, "stored new classifier");
        }
        Ok(())
    }

    fn store_metadata(
        &self,
        id: &RecordId,
        accept_ready: bool,
        reject_ready: bool,
        accepted: &[RecordId],
    ) -> Result<(), StorageError> {
        let touched =
            classifiers::update_metadata(&self.conn, id, accept_ready, reject_ready, accepted)?;
        if touched == 0 {
            return Err(StorageError::UnknownCluster {
                id: id.to_string(),
            });
        }
        Ok(())
    }

    fn associate(&self, canonical: &RecordId, alias: &RecordId) -> Result<(), StorageError> {
        match assoc::lookup(&self.conn, alias)? {
            None => assoc::insert(&self.conn, alias, canonical),
            Some(existing) if existing == *canonical => Ok(()),
            Some(existing) => Err(StorageError::AssociationConflict {
                alias: alias.to_string(),
                existing: existing.to_string(),
                requested: canonical.to_string(),
            }),
        }
    }
}
