//! Note store database: connection bootstrap and schema upgrades.
//!
//! # Responsibility
//! - Hand out SQLite connections whose `notes` schema is current.
//! - Report which schema step failed when an upgrade breaks.
//!
//! # Invariants
//! - The note store schema version lives in `PRAGMA user_version`.
//! - A store written by a newer binary is never opened or downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Note store bootstrap error.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The store was written by a newer schema than this binary knows.
    UnsupportedSchema {
        store_version: u32,
        supported_version: u32,
    },
    /// One schema step failed; the whole upgrade was rolled back.
    Migration {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "note store error: {err}"),
            Self::UnsupportedSchema {
                store_version,
                supported_version,
            } => write!(
                f,
                "note store uses schema v{store_version}, this build supports up to v{supported_version}"
            ),
            Self::Migration {
                version,
                name,
                source,
            } => write!(
                f,
                "note store upgrade to v{version} ({name}) failed: {source}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::UnsupportedSchema { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
