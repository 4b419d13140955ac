//! Versioned schema migrations, tracked via `PRAGMA user_version`.

pub mod v001_initial;

use rusqlite::Connection;
use tracing::info;

use tally_core::errors::StorageError;

use crate::to_sql_err;

const MIGRATIONS: &[(i64, &str)] = &[(1, v001_initial::MIGRATION_SQL)];

/// Bring the schema up to the latest version. Each migration runs inside
/// its own transaction; a failure leaves the database at the last version
/// that fully applied.
pub fn run_migrations(conn: &Connection) -> Result<(), StorageError> {
    let current: i64 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(to_sql_err)?;

    for (version, sql) in MIGRATIONS {
        if *version <= current {
            continue;
        }
        let tx = conn.unchecked_transaction().map_err(to_sql_err)?;
        tx.execute_batch(sql).map_err(to_sql_err)?;
        tx.pragma_update(None, "user_version", version)
            .map_err(to_sql_err)?;
        tx.commit().map_err(to_sql_err)?;
        info!(version = *version, "applied schema migration");
    }
    Ok(())
}
