//! Failures raised by the SQLite store.

use std::path::PathBuf;

use thiserror::Error;
use waymark_core::StoreError;

/// Error raised when opening or querying the SQLite database.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path}: {source}")]
    OpenDatabase {
        /// Location of the SQLite database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A relation member row carried a type name outside the known set.
    #[error("relation member type {found:?} is not node, way or relation")]
    InvalidMemberType {
        /// The stored type name.
        found: String,
    },
    /// Generic SQLite error while reading rows.
    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        Self::new(error)
    }
}
