//! SQLite snapshot storage for the catalog.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the snapshot file.
//! - Apply schema migrations in deterministic order.
//! - Save and load whole-catalog snapshots.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Snapshot data is never read or written before migrations succeed.
//! - A snapshot save is one transaction: primary and cascaded deletes are
//!   persisted together or not at all.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;
pub mod snapshot;

pub use open::{open_db, open_db_in_memory};
pub use snapshot::{CatalogSnapshot, SnapshotStore, SqliteSnapshotStore, TableSnapshot};

pub type DbResult<T> = Result<T, DbError>;

/// Failures of the snapshot file layer.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// File schema is ahead of this build; nothing was modified.
    SchemaTooNew { found: u32, supported: u32 },
    /// Persisted rows cannot be turned back into valid catalog records.
    InvalidData(String),
}

impl DbError {
    /// Stable code for log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "sqlite",
            Self::SchemaTooNew { .. } => "schema_too_new",
            Self::InvalidData(_) => "invalid_data",
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "snapshot file uses schema v{found}; this build reads up to v{supported}"
            ),
            Self::InvalidData(message) => write!(f, "invalid snapshot data: {message}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        if let Self::Sqlite(err) = self {
            return Some(err);
        }
        None
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
