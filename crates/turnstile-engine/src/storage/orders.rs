//! Durable per-order idempotency markers.
//!
//! A retried order webhook must not double-grant. The marker is claimed
//! before any grant happens; `INSERT OR IGNORE` + `changes()` makes the
//! claim atomic, so exactly one delivery of a given order id wins.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use turnstile_core::types::OrderId;

use super::to_ts;
use crate::errors::TurnstileResult;

/// Claim the marker for an order. Returns true exactly once per order
/// id; subsequent claims return false.
pub fn claim_order(conn: &Connection, order_id: OrderId, now: DateTime<Utc>) -> TurnstileResult<bool> {
    conn.execute(
        "INSERT OR IGNORE INTO processed_orders (order_id, processed_at) VALUES (?1, ?2)",
        params![order_id, to_ts(now)],
    )?;
    Ok(conn.changes() > 0)
}

pub fn is_order_processed(conn: &Connection, order_id: OrderId) -> TurnstileResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM processed_orders WHERE order_id = ?1",
        params![order_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::migrations::migrate;

    fn db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::storage::pragmas::configure_connection(&conn).unwrap();
        migrate(&conn).unwrap();
        conn
    }

    #[test]
    fn test_first_claim_wins() {
        let conn = db();
        let now = Utc::now();
        assert!(claim_order(&conn, 100, now).unwrap());
        assert!(!claim_order(&conn, 100, now).unwrap());
        assert!(is_order_processed(&conn, 100).unwrap());
    }

    #[test]
    fn test_distinct_orders_independent() {
        let conn = db();
        let now = Utc::now();
        assert!(claim_order(&conn, 100, now).unwrap());
        assert!(claim_order(&conn, 101, now).unwrap());
        assert!(!is_order_processed(&conn, 102).unwrap());
    }
}
