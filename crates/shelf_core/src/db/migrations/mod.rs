//! Schema history of the snapshot file.
//!
//! # Invariants
//! - `SCHEMA_HISTORY` is ordered by version, starting at 1 with no gaps.
//! - `PRAGMA user_version` equals the last step applied to the file.
//! - All pending steps commit together or none do.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, Transaction};

/// One schema step: version, name used in log events, SQL batch.
type SchemaStep = (u32, &'static str, &'static str);

const SCHEMA_HISTORY: &[SchemaStep] = &[(1, "catalog_tables", include_str!("0001_init.sql"))];

/// Schema version written by this build.
pub fn latest_version() -> u32 {
    SCHEMA_HISTORY.last().map_or(0, |&(version, _, _)| version)
}

/// Brings the snapshot schema up to `latest_version()`.
///
/// # Errors
/// - `SchemaTooNew` when the file was written by a newer build; the file is
///   left untouched.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found = stored_version(conn)?;
    let supported = latest_version();
    if found > supported {
        return Err(DbError::SchemaTooNew { found, supported });
    }

    let pending: Vec<&SchemaStep> = SCHEMA_HISTORY
        .iter()
        .filter(|&&(version, _, _)| version > found)
        .collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for &&(version, name, sql) in &pending {
        run_step(&tx, version, sql)?;
        info!("event=db_migrate_step module=db status=ok version={version} name={name}");
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={} steps={}",
        found,
        supported,
        pending.len()
    );
    Ok(())
}

fn run_step(tx: &Transaction<'_>, version: u32, sql: &str) -> DbResult<()> {
    tx.execute_batch(sql)?;
    tx.pragma_update(None, "user_version", version)?;
    Ok(())
}

fn stored_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}
