//! Session-scoped connection management.
//!
//! The engine is single-threaded, so storage holds exactly one connection,
//! acquired at session start and released when the store is dropped. Each
//! operation commits on its own; there is nothing to flush at exit beyond
//! what SQLite already guarantees on close.

pub mod pragmas;

use std::path::Path;

use rusqlite::Connection;
use tracing::debug;

use tally_core::errors::StorageError;

use crate::migrations;
use crate::to_sql_err;

/// Open the database at `path`, apply pragmas, and run migrations.
pub fn open(path: &Path) -> Result<Connection, StorageError> {
    let conn = Connection::open(path).map_err(to_sql_err)?;
    pragmas::apply_pragmas(&conn)?;
    migrations::run_migrations(&conn)?;
    debug!(path = %path.display(), "opened classifier store");
    Ok(conn)
}

/// Open an in-memory database (for testing).
pub fn open_in_memory() -> Result<Connection, StorageError> {
    let conn = Connection::open_in_memory().map_err(to_sql_err)?;
    pragmas::apply_pragmas(&conn)?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}
