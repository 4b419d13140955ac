//! # tally-storage
//!
//! SQLite persistence for classifier state and identity associations.
//! One connection per session, auto-committed operations, versioned
//! migrations, and the single conforming [`tally_core::ClassifierStore`]
//! implementation.

pub mod connection;
pub mod migrations;
pub mod queries;
pub mod store;

pub use store::SqliteStore;

use tally_core::errors::StorageError;

/// Convert a low-level SQLite failure into the subsystem error.
pub(crate) fn to_sql_err(message: impl ToString) -> StorageError {
    StorageError::Sqlite {
        message: message.to_string(),
    }
}
