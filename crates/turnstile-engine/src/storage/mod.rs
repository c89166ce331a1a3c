//! SQLite persistence: PRAGMAs, schema, migrations, pool, and the
//! per-table query modules.

pub mod memberships;
pub mod migrations;
pub mod orders;
pub mod plans;
pub mod pool;
pub mod pragmas;
pub mod products;
pub mod rules;
pub mod schema;

use chrono::{DateTime, Utc};

pub use migrations::migrate;
pub use pool::ConnectionPool;
pub use pragmas::{configure_connection, configure_readonly_connection};
pub use schema::TABLE_NAMES;

/// Persisted timestamps are unix seconds.
pub(crate) fn to_ts(instant: DateTime<Utc>) -> i64 {
    instant.timestamp()
}

pub(crate) fn from_ts(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

pub(crate) fn opt_from_ts(ts: Option<i64>) -> Option<DateTime<Utc>> {
    ts.map(from_ts)
}
