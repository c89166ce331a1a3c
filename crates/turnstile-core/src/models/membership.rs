//! Membership: one user's time-bounded claim to one plan.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{MembershipId, OrderId, ParseEnumError, PlanId, SubscriptionId, UserId};

/// Provenance tag: how the membership was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipSource {
    Purchase,
    Subscription,
    Manual,
    Import,
}

impl MembershipSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Subscription => "subscription",
            Self::Manual => "manual",
            Self::Import => "import",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ParseEnumError> {
        match value {
            "purchase" => Ok(Self::Purchase),
            "subscription" => Ok(Self::Subscription),
            "manual" => Ok(Self::Manual),
            "import" => Ok(Self::Import),
            other => Err(ParseEnumError {
                kind: "membership_source",
                value: other.to_string(),
            }),
        }
    }
}

/// Membership lifecycle state.
///
/// Transitions: `Active` → {`Expired`, `Cancelled`, `Paused`};
/// `Paused` → {`Active`, `Cancelled`}. `Expired` and `Cancelled` are
/// terminal; a re-grant creates a new record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Active,
    Expired,
    Cancelled,
    Paused,
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
            Self::Paused => "paused",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ParseEnumError> {
        match value {
            "active" => Ok(Self::Active),
            "expired" => Ok(Self::Expired),
            "cancelled" => Ok(Self::Cancelled),
            "paused" => Ok(Self::Paused),
            other => Err(ParseEnumError {
                kind: "membership_status",
                value: other.to_string(),
            }),
        }
    }
}

/// One user's claim to one plan over one continuous period.
///
/// `end_date = None` means unbounded/lifetime. `cancelled_at` is set if
/// and only if the status is `Cancelled`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub id: MembershipId,
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub order_id: Option<OrderId>,
    pub subscription_id: Option<SubscriptionId>,
    pub source: MembershipSource,
    pub status: MembershipStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Membership {
    pub fn is_active(&self) -> bool {
        self.status == MembershipStatus::Active
    }

    /// Whether the end date has passed, regardless of status.
    pub fn is_lapsed(&self, now: DateTime<Utc>) -> bool {
        matches!(self.end_date, Some(end) if end < now)
    }

    /// Expired by status, or lapsed by date even if the sweeper has not
    /// caught up yet.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == MembershipStatus::Expired || self.is_lapsed(now)
    }

    pub fn is_from_subscription(&self) -> bool {
        self.source == MembershipSource::Subscription && self.subscription_id.is_some()
    }

    /// Whole days remaining until expiry, rounded up. `None` for
    /// unbounded memberships, zero once lapsed.
    pub fn remaining_days(&self, now: DateTime<Utc>) -> Option<i64> {
        let end = self.end_date?;
        let secs = (end - now).num_seconds();
        if secs <= 0 {
            return Some(0);
        }
        Some((secs as u64).div_ceil(86_400) as i64)
    }
}
