//! ContentRule: ties one content item to one plan that restricts it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ContentId, PlanId};

/// One (content item, plan) restriction pair.
///
/// A content item with zero rules is unrestricted. A content item with
/// one or more rules requires an active membership in at least one of
/// the referenced plans (OR semantics). `(content_id, plan_id)` is
/// unique; `content_type` is informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRule {
    pub id: i64,
    pub content_id: ContentId,
    pub content_type: String,
    pub plan_id: PlanId,
    pub created_at: DateTime<Utc>,
}
