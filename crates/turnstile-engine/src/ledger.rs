//! Membership ledger: host-facing reads over membership records.
//!
//! Mutations go through the lifecycle engine; the only write here is
//! the explicit removal call used by admin cleanup.

use std::sync::Arc;

use chrono::Utc;
use turnstile_core::models::Membership;
use turnstile_core::types::{MembershipId, PlanId, SubscriptionId, UserId};

use crate::errors::TurnstileResult;
use crate::storage::{self, ConnectionPool};

#[derive(Clone)]
pub struct MembershipLedger {
    pool: Arc<ConnectionPool>,
}

impl MembershipLedger {
    pub(crate) fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    pub fn get(&self, id: MembershipId) -> TurnstileResult<Option<Membership>> {
        self.pool
            .with_reader(|conn| storage::memberships::get_membership(conn, id))
    }

    /// A user's memberships, newest first.
    pub fn for_user(&self, user_id: UserId, active_only: bool) -> TurnstileResult<Vec<Membership>> {
        self.pool
            .with_reader(|conn| storage::memberships::memberships_for_user(conn, user_id, active_only))
    }

    /// Most recent membership for (user, plan), regardless of status.
    pub fn latest_for_user_plan(
        &self,
        user_id: UserId,
        plan_id: PlanId,
    ) -> TurnstileResult<Option<Membership>> {
        self.pool
            .with_reader(|conn| storage::memberships::latest_for_user_plan(conn, user_id, plan_id))
    }

    /// Most recent membership provisioned by a subscription.
    pub fn for_subscription(
        &self,
        subscription_id: SubscriptionId,
    ) -> TurnstileResult<Option<Membership>> {
        self.pool
            .with_reader(|conn| storage::memberships::get_by_subscription(conn, subscription_id))
    }

    /// Whether the user holds an active, unexpired membership to the
    /// plan right now.
    pub fn user_has_plan(&self, user_id: UserId, plan_id: PlanId) -> TurnstileResult<bool> {
        self.pool.with_reader(|conn| {
            storage::memberships::user_has_active_plan(conn, user_id, plan_id, Utc::now())
        })
    }

    /// Active memberships expiring within the next `days` days, soonest
    /// first. Feed for reminder emails.
    pub fn expiring_within(&self, days: u32) -> TurnstileResult<Vec<Membership>> {
        self.pool
            .with_reader(|conn| storage::memberships::expiring_within(conn, Utc::now(), days))
    }

    /// Explicit removal. Lifecycle transitions never delete rows; this
    /// exists for admin cleanup only.
    pub fn remove(&self, id: MembershipId) -> TurnstileResult<bool> {
        self.pool
            .with_writer(|conn| storage::memberships::delete_membership(conn, id))
    }
}
