//! Shared identifier aliases and small cross-cutting types.
//!
//! Identifiers are plain `i64` rowids. References across entities are
//! soft: a `PlanId` held by a membership or rule may point at a plan
//! that no longer exists, and lookups treat that as empty, not an
//! error.

use serde::{Deserialize, Serialize};

pub type PlanId = i64;
pub type MembershipId = i64;
pub type UserId = i64;
pub type ContentId = i64;
pub type ProductId = i64;
pub type OrderId = i64;
pub type SubscriptionId = i64;

/// Why a content item was denied (or not) for a given user.
///
/// The ordering of the denial variants matters to callers rendering a
/// message: `Paused` is reported in preference to `Expired`, which is
/// reported in preference to `NoAccess`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestrictionReason {
    /// Content is unrestricted or the user has access.
    None,
    /// Content is restricted and no user is logged in.
    NotLoggedIn,
    /// The user's relevant membership has lapsed (by status or by date).
    Expired,
    /// The user's relevant membership is on hold.
    Paused,
    /// The user never held any of the required plans.
    NoAccess,
}

impl RestrictionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::NotLoggedIn => "not_logged_in",
            Self::Expired => "expired",
            Self::Paused => "paused",
            Self::NoAccess => "no_access",
        }
    }

    /// Whether this reason denies access.
    pub fn is_denied(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Failure to parse a persisted enum discriminant back into its type.
#[derive(Debug, thiserror::Error)]
#[error("unrecognized {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}
