//! Membership ledger queries.
//!
//! "Latest" always means newest by creation, ties broken by rowid, so
//! two rows created within the same second still order deterministically.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, Row};
use turnstile_core::models::{Membership, MembershipSource, MembershipStatus};
use turnstile_core::types::{MembershipId, OrderId, PlanId, SubscriptionId, UserId};

use super::{from_ts, opt_from_ts, to_ts};
use crate::errors::TurnstileResult;

/// Insert payload for a freshly granted membership (status is always
/// active on creation).
#[derive(Debug, Clone)]
pub struct NewMembership {
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub order_id: Option<OrderId>,
    pub subscription_id: Option<SubscriptionId>,
    pub source: MembershipSource,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

fn row_to_membership(row: &Row) -> rusqlite::Result<Membership> {
    let source: String = row.get("source")?;
    let source = MembershipSource::parse(&source).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let status: String = row.get("status")?;
    let status = MembershipStatus::parse(&status).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Membership {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        plan_id: row.get("plan_id")?,
        order_id: row.get("order_id")?,
        subscription_id: row.get("subscription_id")?,
        source,
        status,
        start_date: from_ts(row.get("start_date")?),
        end_date: opt_from_ts(row.get("end_date")?),
        cancelled_at: opt_from_ts(row.get("cancelled_at")?),
        created_at: from_ts(row.get("created_at")?),
        updated_at: from_ts(row.get("updated_at")?),
    })
}

fn collect<F>(rows: rusqlite::MappedRows<'_, F>) -> TurnstileResult<Vec<Membership>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<Membership>,
{
    let mut memberships = Vec::new();
    for row in rows {
        memberships.push(row?);
    }
    Ok(memberships)
}

pub fn insert_membership(
    conn: &Connection,
    new: &NewMembership,
    now: DateTime<Utc>,
) -> TurnstileResult<MembershipId> {
    conn.execute(
        "INSERT INTO memberships (user_id, plan_id, order_id, subscription_id, source, status,
                start_date, end_date, cancelled_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 'active', ?6, ?7, NULL, ?8, ?8)",
        params![
            new.user_id,
            new.plan_id,
            new.order_id,
            new.subscription_id,
            new.source.as_str(),
            to_ts(new.start_date),
            new.end_date.map(to_ts),
            to_ts(now),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_membership(conn: &Connection, id: MembershipId) -> TurnstileResult<Option<Membership>> {
    let result = conn.query_row(
        "SELECT * FROM memberships WHERE id = ?1",
        params![id],
        row_to_membership,
    );
    match result {
        Ok(membership) => Ok(Some(membership)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Most recent membership for a (user, plan) pair, regardless of
/// status.
pub fn latest_for_user_plan(
    conn: &Connection,
    user_id: UserId,
    plan_id: PlanId,
) -> TurnstileResult<Option<Membership>> {
    let result = conn.query_row(
        "SELECT * FROM memberships WHERE user_id = ?1 AND plan_id = ?2
         ORDER BY created_at DESC, id DESC LIMIT 1",
        params![user_id, plan_id],
        row_to_membership,
    );
    match result {
        Ok(membership) => Ok(Some(membership)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Most recent membership provisioned by a subscription.
pub fn get_by_subscription(
    conn: &Connection,
    subscription_id: SubscriptionId,
) -> TurnstileResult<Option<Membership>> {
    let result = conn.query_row(
        "SELECT * FROM memberships WHERE subscription_id = ?1
         ORDER BY created_at DESC, id DESC LIMIT 1",
        params![subscription_id],
        row_to_membership,
    );
    match result {
        Ok(membership) => Ok(Some(membership)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// A user's memberships, newest first.
pub fn memberships_for_user(
    conn: &Connection,
    user_id: UserId,
    active_only: bool,
) -> TurnstileResult<Vec<Membership>> {
    let sql = if active_only {
        "SELECT * FROM memberships WHERE user_id = ?1 AND status = 'active'
         ORDER BY created_at DESC, id DESC"
    } else {
        "SELECT * FROM memberships WHERE user_id = ?1 ORDER BY created_at DESC, id DESC"
    };
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![user_id], row_to_membership)?;
    collect(rows)
}

/// Whether the user holds an active, unexpired membership to the plan.
///
/// Date expiry is checked here directly, so access stays correct even
/// between sweeper runs.
pub fn user_has_active_plan(
    conn: &Connection,
    user_id: UserId,
    plan_id: PlanId,
    now: DateTime<Utc>,
) -> TurnstileResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM memberships
         WHERE user_id = ?1 AND plan_id = ?2 AND status = 'active'
           AND (end_date IS NULL OR end_date > ?3)",
        params![user_id, plan_id, to_ts(now)],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Active memberships whose end date has passed — the sweeper's work
/// list.
pub fn lapsed_active(conn: &Connection, now: DateTime<Utc>) -> TurnstileResult<Vec<Membership>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM memberships
         WHERE status = 'active' AND end_date IS NOT NULL AND end_date < ?1",
    )?;
    let rows = stmt.query_map(params![to_ts(now)], row_to_membership)?;
    collect(rows)
}

/// Active memberships expiring within the next `days` days (reminder
/// feeds).
pub fn expiring_within(
    conn: &Connection,
    now: DateTime<Utc>,
    days: u32,
) -> TurnstileResult<Vec<Membership>> {
    let horizon = now + Duration::days(i64::from(days));
    let mut stmt = conn.prepare(
        "SELECT * FROM memberships
         WHERE status = 'active' AND end_date IS NOT NULL AND end_date > ?1 AND end_date <= ?2
         ORDER BY end_date ASC",
    )?;
    let rows = stmt.query_map(params![to_ts(now), to_ts(horizon)], row_to_membership)?;
    collect(rows)
}

/// Flip status. `cancelled_at` is written when (and only when) the new
/// status is cancelled, preserving the "set iff cancelled" invariant.
pub fn update_status(
    conn: &Connection,
    id: MembershipId,
    status: MembershipStatus,
    now: DateTime<Utc>,
) -> TurnstileResult<bool> {
    let cancelled_at = (status == MembershipStatus::Cancelled).then(|| to_ts(now));
    let changed = conn.execute(
        "UPDATE memberships SET status = ?1, cancelled_at = ?2, updated_at = ?3 WHERE id = ?4",
        params![status.as_str(), cancelled_at, to_ts(now), id],
    )?;
    Ok(changed > 0)
}

/// Write a new end date and force the row back to active (extension /
/// renewal path).
pub fn update_extension(
    conn: &Connection,
    id: MembershipId,
    new_end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> TurnstileResult<bool> {
    let changed = conn.execute(
        "UPDATE memberships SET end_date = ?1, status = 'active', updated_at = ?2 WHERE id = ?3",
        params![new_end.map(to_ts), to_ts(now), id],
    )?;
    Ok(changed > 0)
}

/// Explicit removal (admin cleanup). Lifecycle transitions never delete.
pub fn delete_membership(conn: &Connection, id: MembershipId) -> TurnstileResult<bool> {
    let changed = conn.execute("DELETE FROM memberships WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}
