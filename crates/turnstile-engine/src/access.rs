//! Access evaluator: may this user view this content item, and if not,
//! why not.
//!
//! Pure read path — safe to call on every content render.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use turnstile_core::models::MembershipStatus;
use turnstile_core::types::{ContentId, PlanId, RestrictionReason, UserId};

use crate::errors::TurnstileResult;
use crate::storage::{self, ConnectionPool};

/// Capability check delegated to the host. Administrators bypass
/// content restrictions entirely.
pub trait AdminProbe: Send + Sync {
    fn is_administrator(&self, user_id: UserId) -> bool;
}

/// Default probe for hosts without an administrator concept.
pub struct NoAdmins;

impl AdminProbe for NoAdmins {
    fn is_administrator(&self, _user_id: UserId) -> bool {
        false
    }
}

#[derive(Clone)]
pub struct AccessEvaluator {
    pool: Arc<ConnectionPool>,
    admins: Arc<dyn AdminProbe>,
}

impl AccessEvaluator {
    pub(crate) fn new(pool: Arc<ConnectionPool>, admins: Arc<dyn AdminProbe>) -> Self {
        Self { pool, admins }
    }

    /// Whether `user` (None = anonymous) may view `content_id` right
    /// now.
    pub fn can_access(&self, content_id: ContentId, user: Option<UserId>) -> TurnstileResult<bool> {
        self.can_access_at(content_id, user, Utc::now())
    }

    /// Time-parameterized variant of [`Self::can_access`].
    ///
    /// An unknown content id resolves to "no rules found" and therefore
    /// open access; a rule pointing at a deleted plan simply never
    /// matches.
    pub fn can_access_at(
        &self,
        content_id: ContentId,
        user: Option<UserId>,
        now: DateTime<Utc>,
    ) -> TurnstileResult<bool> {
        if let Some(user_id) = user {
            if self.admins.is_administrator(user_id) {
                return Ok(true);
            }
        }

        self.pool.with_reader(|conn| {
            let plan_ids = storage::rules::plan_ids_for_content(conn, content_id)?;
            if plan_ids.is_empty() {
                return Ok(true);
            }
            let Some(user_id) = user else {
                return Ok(false);
            };
            for plan_id in plan_ids {
                if storage::memberships::user_has_active_plan(conn, user_id, plan_id, now)? {
                    return Ok(true);
                }
            }
            Ok(false)
        })
    }

    /// The precise denial reason for `content_id`, or
    /// `RestrictionReason::None` when access would be granted.
    pub fn restriction_reason(
        &self,
        content_id: ContentId,
        user: Option<UserId>,
    ) -> TurnstileResult<RestrictionReason> {
        self.restriction_reason_at(content_id, user, Utc::now())
    }

    /// Time-parameterized variant of [`Self::restriction_reason`].
    ///
    /// Denial reasons are ranked: paused is reported over expired, and
    /// expired over no_access, across all restricting plans. Callers
    /// render different messages per reason, so the ordering is part of
    /// the contract.
    pub fn restriction_reason_at(
        &self,
        content_id: ContentId,
        user: Option<UserId>,
        now: DateTime<Utc>,
    ) -> TurnstileResult<RestrictionReason> {
        if let Some(user_id) = user {
            if self.admins.is_administrator(user_id) {
                return Ok(RestrictionReason::None);
            }
        }

        self.pool.with_reader(|conn| {
            let plan_ids = storage::rules::plan_ids_for_content(conn, content_id)?;
            if plan_ids.is_empty() {
                return Ok(RestrictionReason::None);
            }
            let Some(user_id) = user else {
                return Ok(RestrictionReason::NotLoggedIn);
            };

            for &plan_id in &plan_ids {
                if storage::memberships::user_has_active_plan(conn, user_id, plan_id, now)? {
                    return Ok(RestrictionReason::None);
                }
            }

            denial_reason(conn, user_id, &plan_ids, now)
        })
    }
}

/// Rank the user's standing across the restricting plans: paused
/// short-circuits, then expired (by status or by date), then no_access.
fn denial_reason(
    conn: &Connection,
    user_id: UserId,
    plan_ids: &[PlanId],
    now: DateTime<Utc>,
) -> TurnstileResult<RestrictionReason> {
    let mut saw_expired = false;

    for &plan_id in plan_ids {
        let Some(membership) =
            storage::memberships::latest_for_user_plan(conn, user_id, plan_id)?
        else {
            continue;
        };
        if membership.status == MembershipStatus::Paused {
            return Ok(RestrictionReason::Paused);
        }
        if membership.is_expired(now) {
            saw_expired = true;
        }
    }

    if saw_expired {
        Ok(RestrictionReason::Expired)
    } else {
        Ok(RestrictionReason::NoAccess)
    }
}
