//! ProductLink: purchasing this product grants this plan.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{PlanId, ProductId};

/// Association between an external product and a plan.
///
/// `(plan_id, product_id)` is unique. The product id points into the
/// commerce host's catalog; it is a soft reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductLink {
    pub id: i64,
    pub plan_id: PlanId,
    pub product_id: ProductId,
    pub product_type: String,
    pub created_at: DateTime<Utc>,
}
