//! ConnectionPool — writer + read pool with round-robin selection.
//!
//! The only place in the engine that holds `Mutex<Connection>`. The
//! single writer mutex is also the write-serialization point: two
//! concurrent grants for the same (user, plan) run their
//! read-then-write sequence one at a time.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rusqlite::Connection;

use crate::errors::{TurnstileError, TurnstileResult};
use crate::storage;

/// Default number of reader connections.
const DEFAULT_READ_POOL_SIZE: usize = 2;

/// Connection pool: 1 writer + N readers over the membership database.
///
/// WAL mode is enabled on all connections. Round-robin reader selection
/// via atomic counter.
pub struct ConnectionPool {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    read_index: AtomicUsize,
}

impl ConnectionPool {
    /// Open a file-backed connection pool.
    ///
    /// Creates `read_pool_size` reader connections + 1 writer
    /// connection, all configured via the standard PRAGMAs.
    pub fn open(path: &Path, read_pool_size: usize) -> TurnstileResult<Self> {
        let pool_size = if read_pool_size == 0 {
            DEFAULT_READ_POOL_SIZE
        } else {
            read_pool_size
        };

        let writer = Connection::open(path).map_err(|e| {
            TurnstileError::Config(format!("Failed to open writer connection: {}", e))
        })?;
        storage::configure_connection(&writer)?;

        let mut readers = Vec::with_capacity(pool_size);
        for i in 0..pool_size {
            let reader = Connection::open_with_flags(
                path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .map_err(|e| {
                TurnstileError::Config(format!("Failed to open reader connection {}: {}", i, e))
            })?;
            storage::configure_readonly_connection(&reader)?;
            readers.push(Mutex::new(reader));
        }

        Ok(Self {
            writer: Mutex::new(writer),
            readers,
            read_index: AtomicUsize::new(0),
        })
    }

    /// Open an in-memory connection pool.
    ///
    /// SQLite in-memory databases are private to their connection, so
    /// no readers are created; `with_reader` falls back to the writer
    /// and all operations share the single connection.
    pub fn open_in_memory() -> TurnstileResult<Self> {
        let writer = Connection::open_in_memory().map_err(|e| {
            TurnstileError::Config(format!("Failed to open in-memory connection: {}", e))
        })?;
        storage::configure_connection(&writer)?;

        Ok(Self {
            writer: Mutex::new(writer),
            readers: Vec::new(),
            read_index: AtomicUsize::new(0),
        })
    }

    /// Execute a closure with the writer connection.
    pub fn with_writer<F, T>(&self, f: F) -> TurnstileResult<T>
    where
        F: FnOnce(&Connection) -> TurnstileResult<T>,
    {
        let conn = self
            .writer
            .lock()
            .map_err(|e| TurnstileError::Config(format!("Writer lock poisoned: {}", e)))?;
        f(&conn)
    }

    /// Execute a closure with a reader connection (round-robin).
    ///
    /// Falls back to the writer if no readers exist (in-memory mode).
    pub fn with_reader<F, T>(&self, f: F) -> TurnstileResult<T>
    where
        F: FnOnce(&Connection) -> TurnstileResult<T>,
    {
        if self.readers.is_empty() {
            return self.with_writer(f);
        }

        let index = self.read_index.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let conn = self.readers[index]
            .lock()
            .map_err(|e| TurnstileError::Config(format!("Reader lock poisoned: {}", e)))?;
        f(&conn)
    }

    /// Check WAL mode on the writer connection.
    pub fn is_wal_mode(&self) -> bool {
        self.with_writer(|conn| {
            let mode: String = conn
                .query_row("PRAGMA journal_mode", [], |row| row.get(0))
                .unwrap_or_default();
            Ok(mode.to_lowercase() == "wal")
        })
        .unwrap_or(false)
    }
}
