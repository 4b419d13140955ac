//! PRAGMA configuration applied to every connection.

use rusqlite::Connection;

use tally_core::errors::StorageError;

use crate::to_sql_err;

/// Apply safety and performance pragmas.
pub fn apply_pragmas(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        PRAGMA foreign_keys = ON;
        ",
    )
    .map_err(to_sql_err)?;
    Ok(())
}
