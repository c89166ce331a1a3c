//! Content rule queries, including the transactional replace-set sync.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use turnstile_core::models::ContentRule;
use turnstile_core::types::{ContentId, PlanId};

use super::{from_ts, to_ts};
use crate::errors::TurnstileResult;

fn row_to_rule(row: &Row) -> rusqlite::Result<ContentRule> {
    Ok(ContentRule {
        id: row.get("id")?,
        content_id: row.get("content_id")?,
        content_type: row.get("content_type")?,
        plan_id: row.get("plan_id")?,
        created_at: from_ts(row.get("created_at")?),
    })
}

pub fn rules_for_content(
    conn: &Connection,
    content_id: ContentId,
) -> TurnstileResult<Vec<ContentRule>> {
    let mut stmt =
        conn.prepare("SELECT * FROM content_rules WHERE content_id = ?1 ORDER BY id ASC")?;
    let rows = stmt.query_map(params![content_id], row_to_rule)?;
    let mut rules = Vec::new();
    for row in rows {
        rules.push(row?);
    }
    Ok(rules)
}

/// Plan ids restricting a content item, in rule insertion order.
pub fn plan_ids_for_content(
    conn: &Connection,
    content_id: ContentId,
) -> TurnstileResult<Vec<PlanId>> {
    let mut stmt =
        conn.prepare("SELECT plan_id FROM content_rules WHERE content_id = ?1 ORDER BY id ASC")?;
    let rows = stmt.query_map(params![content_id], |row| row.get::<_, PlanId>(0))?;
    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

pub fn rules_for_plan(conn: &Connection, plan_id: PlanId) -> TurnstileResult<Vec<ContentRule>> {
    let mut stmt = conn.prepare("SELECT * FROM content_rules WHERE plan_id = ?1 ORDER BY id ASC")?;
    let rows = stmt.query_map(params![plan_id], row_to_rule)?;
    let mut rules = Vec::new();
    for row in rows {
        rules.push(row?);
    }
    Ok(rules)
}

pub fn is_restricted(conn: &Connection, content_id: ContentId) -> TurnstileResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM content_rules WHERE content_id = ?1",
        params![content_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Replace the full rule set for a content item in one transaction, so
/// no reader ever observes the item momentarily unrestricted mid-sync.
pub fn replace_for_content(
    conn: &Connection,
    content_id: ContentId,
    content_type: &str,
    plan_ids: &[PlanId],
    now: DateTime<Utc>,
) -> TurnstileResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM content_rules WHERE content_id = ?1",
        params![content_id],
    )?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO content_rules (content_id, content_type, plan_id, created_at)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for plan_id in plan_ids {
            stmt.execute(params![content_id, content_type, plan_id, to_ts(now)])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// Replace the full content set for a plan in one transaction (the
/// plan-editor side of the same sync).
pub fn replace_for_plan(
    conn: &Connection,
    plan_id: PlanId,
    contents: &[(ContentId, &str)],
    now: DateTime<Utc>,
) -> TurnstileResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM content_rules WHERE plan_id = ?1",
        params![plan_id],
    )?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO content_rules (content_id, content_type, plan_id, created_at)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (content_id, content_type) in contents {
            stmt.execute(params![content_id, content_type, plan_id, to_ts(now)])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// Wholesale removal when the owning content item is deleted.
pub fn remove_all_for_content(conn: &Connection, content_id: ContentId) -> TurnstileResult<bool> {
    let changed = conn.execute(
        "DELETE FROM content_rules WHERE content_id = ?1",
        params![content_id],
    )?;
    Ok(changed > 0)
}

/// Wholesale removal when the owning plan is deleted.
pub fn remove_all_for_plan(conn: &Connection, plan_id: PlanId) -> TurnstileResult<bool> {
    let changed = conn.execute(
        "DELETE FROM content_rules WHERE plan_id = ?1",
        params![plan_id],
    )?;
    Ok(changed > 0)
}
