//! Plan-product association queries.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use turnstile_core::models::ProductLink;
use turnstile_core::types::{PlanId, ProductId};

use super::{from_ts, to_ts};
use crate::errors::TurnstileResult;

fn row_to_link(row: &Row) -> rusqlite::Result<ProductLink> {
    Ok(ProductLink {
        id: row.get("id")?,
        plan_id: row.get("plan_id")?,
        product_id: row.get("product_id")?,
        product_type: row.get("product_type")?,
        created_at: from_ts(row.get("created_at")?),
    })
}

/// Plans granted by purchasing a product. Empty when the product maps
/// to nothing (a normal case for non-membership products).
pub fn plans_for_product(conn: &Connection, product_id: ProductId) -> TurnstileResult<Vec<PlanId>> {
    let mut stmt =
        conn.prepare("SELECT plan_id FROM plan_products WHERE product_id = ?1 ORDER BY id ASC")?;
    let rows = stmt.query_map(params![product_id], |row| row.get::<_, PlanId>(0))?;
    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

pub fn products_for_plan(conn: &Connection, plan_id: PlanId) -> TurnstileResult<Vec<ProductLink>> {
    let mut stmt = conn.prepare("SELECT * FROM plan_products WHERE plan_id = ?1 ORDER BY id ASC")?;
    let rows = stmt.query_map(params![plan_id], row_to_link)?;
    let mut links = Vec::new();
    for row in rows {
        links.push(row?);
    }
    Ok(links)
}

/// Replace the full product set for a plan in one transaction.
pub fn replace_for_plan(
    conn: &Connection,
    plan_id: PlanId,
    products: &[(ProductId, &str)],
    now: DateTime<Utc>,
) -> TurnstileResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM plan_products WHERE plan_id = ?1",
        params![plan_id],
    )?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO plan_products (plan_id, product_id, product_type, created_at)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (product_id, product_type) in products {
            stmt.execute(params![plan_id, product_id, product_type, to_ts(now)])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// Wholesale removal when the owning plan is deleted.
pub fn remove_all_for_plan(conn: &Connection, plan_id: PlanId) -> TurnstileResult<bool> {
    let changed = conn.execute(
        "DELETE FROM plan_products WHERE plan_id = ?1",
        params![plan_id],
    )?;
    Ok(changed > 0)
}
