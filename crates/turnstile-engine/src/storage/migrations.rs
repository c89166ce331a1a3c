//! Schema versioning.
//!
//! - Dedicated single-row version table (immune to data cleanup)
//! - Each version bump is a const SQL string in schema.rs
//! - `migrate` is idempotent

use rusqlite::Connection;
use tracing::info;

use super::schema::TABLES_V1;
use crate::errors::TurnstileResult;

/// Current schema version. Bump this when adding new migrations.
pub const CURRENT_VERSION: u32 = 1;

/// Get the current schema version from the database. Zero for a fresh
/// database.
pub fn get_schema_version(conn: &Connection) -> TurnstileResult<u32> {
    let table_exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
        [],
        |row| row.get(0),
    )?;

    if !table_exists {
        return Ok(0);
    }

    let result = conn.query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
        row.get::<_, u32>(0)
    });
    match result {
        Ok(version) => Ok(version),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(e.into()),
    }
}

fn set_schema_version(conn: &Connection, version: u32) -> TurnstileResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER NOT NULL
        ) STRICT;",
    )?;
    // Upsert: delete old row, insert new
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        rusqlite::params![version],
    )?;
    Ok(())
}

/// Run all pending migrations to bring the database up to
/// CURRENT_VERSION. Returns the version the database was migrated to.
pub fn migrate(conn: &Connection) -> TurnstileResult<u32> {
    let current = get_schema_version(conn)?;

    if current >= CURRENT_VERSION {
        return Ok(current);
    }

    if current < 1 {
        info!("Migrating schema: 0 → 1 (initial tables)");
        conn.execute_batch(TABLES_V1)?;
        set_schema_version(conn, 1)?;
    }

    // Future migrations go here:
    // if current < 2 {
    //     info!("Migrating schema: 1 → 2");
    //     conn.execute_batch(TABLES_V2)?;
    //     set_schema_version(conn, 2)?;
    // }

    let final_version = get_schema_version(conn)?;
    info!(from = current, to = final_version, "Schema migration complete");
    Ok(final_version)
}
