//! SQLite PRAGMA configuration.
//!
//! Must be called on every connection immediately after opening.

use rusqlite::Connection;

use crate::errors::TurnstileResult;

/// Configure a SQLite connection with production-grade PRAGMAs.
///
/// - WAL for concurrent readers during writes
/// - busy_timeout for lock contention (primary concurrency mechanism)
/// - mmap for faster reads on large ledgers
/// - NORMAL synchronous for WAL durability trade-off
pub fn configure_connection(conn: &Connection) -> TurnstileResult<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        PRAGMA cache_size = -8000;
        PRAGMA mmap_size = 268435456;
        PRAGMA temp_store = MEMORY;
        ",
    )?;
    Ok(())
}

/// Configure a read-only connection: same PRAGMAs plus `query_only` to
/// prevent accidental writes through a reader.
pub fn configure_readonly_connection(conn: &Connection) -> TurnstileResult<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        PRAGMA cache_size = -8000;
        PRAGMA mmap_size = 268435456;
        PRAGMA temp_store = MEMORY;
        PRAGMA query_only = ON;
        ",
    )?;
    Ok(())
}
