//! Classifier weight and readiness queries.

use rusqlite::{params, Connection, OptionalExtension};

use tally_core::errors::StorageError;
use tally_core::identity::RecordId;
use tally_core::traits::StoredClassifier;

use crate::to_sql_err;

/// Fetch stored classifier state by canonical identity.
pub fn get(
    conn: &Connection,
    canonical: &RecordId,
) -> Result<Option<StoredClassifier>, StorageError> {
    let row = conn
        .query_row(
            "SELECT serialized_weights, accept_ready, reject_ready, accepted_ids
             FROM weights WHERE canonical_id = ?1",
            params![canonical.as_str()],
            |row| {
                Ok((
                    row.get::<_, Vec<u8>>(0)?,
                    row.get::<_, bool>(1)?,
                    row.get::<_, bool>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()
        .map_err(to_sql_err)?;

    match row {
        None => Ok(None),
        Some((weights, accept_ready, reject_ready, accepted_json)) => {
            let accepted: Vec<RecordId> =
                serde_json::from_str(&accepted_json).map_err(|e| StorageError::Serialize {
                    message: format!("accepted set for {canonical}: {e}"),
                })?;
            Ok(Some(StoredClassifier {
                weights,
                accept_ready,
                reject_ready,
                accepted,
            }))
        }
    }
}

/// True iff a weights row exists for the canonical identity.
pub fn exists(conn: &Connection, canonical: &RecordId) -> Result<bool, StorageError> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM weights WHERE canonical_id = ?1",
            params![canonical.as_str()],
            |row| row.get(0),
        )
        .map_err(to_sql_err)?;
    Ok(count > 0)
}

/// Insert or update weights and readiness flags.
pub fn upsert(
    conn: &Connection,
    canonical: &RecordId,
    weights: &[u8],
    accept_ready: bool,
    reject_ready: bool,
) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO weights (canonical_id, accept_ready, reject_ready, serialized_weights)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(canonical_id) DO UPDATE SET
           accept_ready = excluded.accept_ready,
           reject_ready = excluded.reject_ready,
           serialized_weights = excluded.serialized_weights",
        params![canonical.as_str(), accept_ready, reject_ready, weights],
    )
    .map_err(to_sql_err)?;
    Ok(())
}

/// Update readiness flags and the accepted-identity set. Returns the
/// number of rows touched so the caller can detect a missing cluster.
pub fn update_metadata(
    conn: &Connection,
    canonical: &RecordId,
    accept_ready: bool,
    reject_ready: bool,
    accepted: &[RecordId],
) -> Result<usize, StorageError> {
    let accepted_json = serde_json::to_string(accepted).map_err(|e| StorageError::Serialize {
        message: format!("accepted set for {canonical}: {e}"),
    })?;
    conn.execute(
        "UPDATE weights SET accept_ready = ?2, reject_ready = ?3, accepted_ids = ?4
         WHERE canonical_id = ?1",
        params![canonical.as_str(), accept_ready, reject_ready, accepted_json],
    )
    .map_err(to_sql_err)
}
