//! Plan table queries.

use rusqlite::{params, Connection, Row};
use turnstile_core::models::{DurationPolicy, Plan, PlanStatus};
use turnstile_core::types::PlanId;

use super::{from_ts, to_ts};
use crate::errors::TurnstileResult;
use chrono::{DateTime, Utc};

fn row_to_plan(row: &Row) -> rusqlite::Result<Plan> {
    let duration_type: String = row.get("duration_type")?;
    let duration_value: Option<u32> = row.get("duration_value")?;
    let duration = DurationPolicy::from_parts(&duration_type, duration_value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let status: String = row.get("status")?;
    let status = PlanStatus::parse(&status).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Plan {
        id: row.get("id")?,
        name: row.get("name")?,
        slug: row.get("slug")?,
        description: row.get("description")?,
        duration,
        priority: row.get("priority")?,
        status,
        created_at: from_ts(row.get("created_at")?),
        updated_at: from_ts(row.get("updated_at")?),
    })
}

#[allow(clippy::too_many_arguments)]
pub fn insert_plan(
    conn: &Connection,
    name: &str,
    slug: &str,
    description: &str,
    duration: DurationPolicy,
    priority: i32,
    status: PlanStatus,
    now: DateTime<Utc>,
) -> TurnstileResult<PlanId> {
    let (duration_type, duration_value) = duration.as_parts();
    conn.execute(
        "INSERT INTO plans (name, slug, description, duration_type, duration_value, priority, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        params![
            name,
            slug,
            description,
            duration_type,
            duration_value,
            priority,
            status.as_str(),
            to_ts(now),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Full-row update; the catalog does read-modify-write.
pub fn update_plan(conn: &Connection, plan: &Plan, now: DateTime<Utc>) -> TurnstileResult<bool> {
    let (duration_type, duration_value) = plan.duration.as_parts();
    let changed = conn.execute(
        "UPDATE plans SET name = ?1, slug = ?2, description = ?3, duration_type = ?4,
                duration_value = ?5, priority = ?6, status = ?7, updated_at = ?8
         WHERE id = ?9",
        params![
            plan.name,
            plan.slug,
            plan.description,
            duration_type,
            duration_value,
            plan.priority,
            plan.status.as_str(),
            to_ts(now),
            plan.id,
        ],
    )?;
    Ok(changed > 0)
}

pub fn get_plan(conn: &Connection, id: PlanId) -> TurnstileResult<Option<Plan>> {
    let result = conn.query_row("SELECT * FROM plans WHERE id = ?1", params![id], row_to_plan);
    match result {
        Ok(plan) => Ok(Some(plan)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_plan_by_slug(conn: &Connection, slug: &str) -> TurnstileResult<Option<Plan>> {
    let result = conn.query_row(
        "SELECT * FROM plans WHERE slug = ?1",
        params![slug],
        row_to_plan,
    );
    match result {
        Ok(plan) => Ok(Some(plan)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All plans, highest priority first, ties broken by name.
pub fn list_plans(conn: &Connection, active_only: bool) -> TurnstileResult<Vec<Plan>> {
    let sql = if active_only {
        "SELECT * FROM plans WHERE status = 'active' ORDER BY priority DESC, name ASC"
    } else {
        "SELECT * FROM plans ORDER BY priority DESC, name ASC"
    };
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], row_to_plan)?;
    let mut plans = Vec::new();
    for row in rows {
        plans.push(row?);
    }
    Ok(plans)
}

pub fn delete_plan(conn: &Connection, id: PlanId) -> TurnstileResult<bool> {
    let changed = conn.execute("DELETE FROM plans WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

/// Whether `slug` is taken by a plan other than `exclude`.
pub fn slug_exists(
    conn: &Connection,
    slug: &str,
    exclude: Option<PlanId>,
) -> TurnstileResult<bool> {
    let count: i64 = match exclude {
        Some(id) => conn.query_row(
            "SELECT COUNT(*) FROM plans WHERE slug = ?1 AND id != ?2",
            params![slug, id],
            |row| row.get(0),
        )?,
        None => conn.query_row(
            "SELECT COUNT(*) FROM plans WHERE slug = ?1",
            params![slug],
            |row| row.get(0),
        )?,
    };
    Ok(count > 0)
}
