//! Alias → canonical identity association queries.

use rusqlite::{params, Connection, OptionalExtension};

use tally_core::errors::StorageError;
use tally_core::identity::RecordId;

use crate::to_sql_err;

/// Canonical identity an alias maps to, if any.
pub fn lookup(conn: &Connection, alias: &RecordId) -> Result<Option<RecordId>, StorageError> {
    conn.query_row(
        "SELECT canonical_id FROM assoc WHERE alias_id = ?1",
        params![alias.as_str()],
        |row| row.get::<_, String>(0),
    )
    .optional()
    .map_err(to_sql_err)
    .map(|found| found.map(RecordId::from_stored))
}

/// True iff the alias has any recorded association.
pub fn exists(conn: &Connection, alias: &RecordId) -> Result<bool, StorageError> {
    lookup(conn, alias).map(|found| found.is_some())
}

/// Insert a new association. Callers are responsible for the conflict
/// check; at this level a duplicate alias is a constraint violation.
pub fn insert(
    conn: &Connection,
    alias: &RecordId,
    canonical: &RecordId,
) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO assoc (alias_id, canonical_id) VALUES (?1, ?2)",
        params![alias.as_str(), canonical.as_str()],
    )
    .map_err(to_sql_err)?;
    Ok(())
}

/// All aliases owned by a canonical identity, in insertion-independent
/// sorted order.
pub fn aliases_of(conn: &Connection, canonical: &RecordId) -> Result<Vec<RecordId>, StorageError> {
    let mut stmt = conn
        .prepare_cached("SELECT alias_id FROM assoc WHERE canonical_id = ?1 ORDER BY alias_id")
        .map_err(to_sql_err)?;
    let rows = stmt
        .query_map(params![canonical.as_str()], |row| row.get::<_, String>(0))
        .map_err(to_sql_err)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(RecordId::from_stored(row.map_err(to_sql_err)?));
    }
    Ok(out)
}
