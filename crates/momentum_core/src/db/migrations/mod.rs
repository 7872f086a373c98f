//! Ordered schema steps for the `notes` store.
//!
//! # Invariants
//! - Step versions start at 1 and increase by one.
//! - Pending steps run in one transaction; `user_version` follows each step.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "notes",
        sql: include_str!("0001_init.sql"),
    },
    SchemaStep {
        version: 2,
        name: "resurfacing",
        sql: include_str!("0002_resurfacing.sql"),
    },
];

/// Schema versions seen before and after an upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaUpgrade {
    pub from: u32,
    pub to: u32,
}

impl SchemaUpgrade {
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

/// Newest note store schema this build can read and write.
pub fn supported_schema_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Schema version recorded in the store.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Brings the note store up to `supported_schema_version`.
///
/// # Errors
/// - `UnsupportedSchema` when the store is newer than this build.
/// - `Migration` naming the first step that failed.
pub fn upgrade_note_store(conn: &mut Connection) -> DbResult<SchemaUpgrade> {
    let from = schema_version(conn)?;
    let supported = supported_schema_version();

    if from > supported {
        return Err(DbError::UnsupportedSchema {
            store_version: from,
            supported_version: supported,
        });
    }
    if from == supported {
        return Ok(SchemaUpgrade { from, to: from });
    }

    let tx = conn.transaction()?;
    for step in SCHEMA_STEPS.iter().filter(|step| step.version > from) {
        tx.execute_batch(step.sql)
            .and_then(|()| tx.pragma_update(None, "user_version", step.version))
            .map_err(|source| DbError::Migration {
                version: step.version,
                name: step.name,
                source,
            })?;
        info!(
            "event=db_migrate module=db status=step version={} name={}",
            step.version, step.name
        );
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={from} to_version={supported}"
    );
    Ok(SchemaUpgrade {
        from,
        to: supported,
    })
}
