//! Plan: a named entitlement tier with a duration policy and priority.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ParseEnumError, PlanId};

use super::duration::DurationPolicy;

/// Whether a plan can currently be granted.
///
/// An inactive plan can no longer be granted, but existing memberships
/// against it are unaffected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    Active,
    Inactive,
}

impl PlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ParseEnumError> {
        match value {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(ParseEnumError {
                kind: "plan_status",
                value: other.to_string(),
            }),
        }
    }
}

/// A named entitlement tier.
///
/// Higher `priority` takes precedence when a user holds multiple
/// overlapping plans; listing orders by priority descending then name
/// ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    /// Unique, URL-safe identifier across non-deleted plans.
    pub slug: String,
    pub description: String,
    pub duration: DurationPolicy,
    pub priority: i32,
    pub status: PlanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Plan {
    pub fn is_active(&self) -> bool {
        self.status == PlanStatus::Active
    }

    /// Expiration instant for a membership to this plan starting at
    /// `start`. `None` for unbounded plans.
    pub fn expiration_from(&self, start: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.duration.expiration_from(start)
    }
}
