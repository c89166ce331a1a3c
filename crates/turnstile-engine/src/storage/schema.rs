//! Schema SQL constants. Used by migrations.rs.
//!
//! All cross-entity references (plan_id, content_id, product_id,
//! user_id) are soft: plain integer columns, no FOREIGN KEY clauses.
//! Lookups treat a missing referent as empty, not a violation.

/// V1 schema: 5 tables + their indexes.
pub const TABLES_V1: &str = "
    CREATE TABLE IF NOT EXISTS plans (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        slug TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        duration_type TEXT NOT NULL DEFAULT 'forever',
        duration_value INTEGER,
        priority INTEGER NOT NULL DEFAULT 0,
        status TEXT NOT NULL DEFAULT 'active',
        created_at INTEGER NOT NULL DEFAULT (unixepoch()),
        updated_at INTEGER NOT NULL DEFAULT (unixepoch())
    ) STRICT;

    CREATE TABLE IF NOT EXISTS memberships (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        plan_id INTEGER NOT NULL,
        order_id INTEGER,
        subscription_id INTEGER,
        source TEXT NOT NULL DEFAULT 'manual',
        status TEXT NOT NULL DEFAULT 'active',
        start_date INTEGER NOT NULL,
        end_date INTEGER,
        cancelled_at INTEGER,
        created_at INTEGER NOT NULL DEFAULT (unixepoch()),
        updated_at INTEGER NOT NULL DEFAULT (unixepoch())
    ) STRICT;

    CREATE TABLE IF NOT EXISTS content_rules (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        content_id INTEGER NOT NULL,
        content_type TEXT NOT NULL,
        plan_id INTEGER NOT NULL,
        created_at INTEGER NOT NULL DEFAULT (unixepoch())
    ) STRICT;

    CREATE TABLE IF NOT EXISTS plan_products (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        plan_id INTEGER NOT NULL,
        product_id INTEGER NOT NULL,
        product_type TEXT NOT NULL DEFAULT 'simple',
        created_at INTEGER NOT NULL DEFAULT (unixepoch())
    ) STRICT;

    CREATE TABLE IF NOT EXISTS processed_orders (
        order_id INTEGER PRIMARY KEY,
        processed_at INTEGER NOT NULL DEFAULT (unixepoch())
    ) STRICT;

    CREATE UNIQUE INDEX IF NOT EXISTS idx_plans_slug ON plans(slug);
    CREATE INDEX IF NOT EXISTS idx_memberships_user_status ON memberships(user_id, status);
    CREATE INDEX IF NOT EXISTS idx_memberships_plan ON memberships(plan_id);
    CREATE INDEX IF NOT EXISTS idx_memberships_subscription ON memberships(subscription_id);
    CREATE UNIQUE INDEX IF NOT EXISTS idx_rules_content_plan ON content_rules(content_id, plan_id);
    CREATE INDEX IF NOT EXISTS idx_rules_plan ON content_rules(plan_id);
    CREATE UNIQUE INDEX IF NOT EXISTS idx_plan_products_pair ON plan_products(plan_id, product_id);
    CREATE INDEX IF NOT EXISTS idx_plan_products_product ON plan_products(product_id);
";

/// All 5 table names.
pub const TABLE_NAMES: [&str; 5] = [
    "plans",
    "memberships",
    "content_rules",
    "plan_products",
    "processed_orders",
];
