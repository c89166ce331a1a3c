//! Membership lifecycle engine: grant / extend / revoke / pause /
//! resume / expire.
//!
//! State machine over `MembershipStatus`: active → {expired, cancelled,
//! paused}; paused → {active, cancelled}; expired and cancelled are
//! terminal — a re-grant creates a new record. Every mutation runs its
//! read-then-write sequence inside the single writer connection, so two
//! concurrent grants for the same (user, plan) cannot both take the
//! "no existing active membership" branch.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use turnstile_core::events::{MembershipEvent, NotificationHub};
use turnstile_core::models::{Membership, MembershipSource, MembershipStatus, Plan};
use turnstile_core::types::{MembershipId, OrderId, PlanId, SubscriptionId, UserId};

use crate::errors::{TurnstileError, TurnstileResult};
use crate::storage::{self, ConnectionPool};

#[derive(Clone)]
pub struct LifecycleEngine {
    pool: Arc<ConnectionPool>,
    hub: Arc<NotificationHub>,
}

/// What a grant call actually did.
enum GrantOutcome {
    Created(MembershipId, MembershipEvent),
    Extended(MembershipId),
}

impl LifecycleEngine {
    pub(crate) fn new(pool: Arc<ConnectionPool>, hub: Arc<NotificationHub>) -> Self {
        Self { pool, hub }
    }

    /// Grant a plan to a user.
    ///
    /// Rejected with `PlanNotFound` / `InactivePlan` when the plan
    /// cannot be granted. When the user's latest membership for this
    /// plan is still active the call extends it instead of creating a
    /// duplicate, making repeated deliveries of the same commerce event
    /// stack rather than fork. A `Granted` notification fires only for
    /// newly created records.
    pub fn grant(
        &self,
        user_id: UserId,
        plan_id: PlanId,
        source: MembershipSource,
        order_id: Option<OrderId>,
        subscription_id: Option<SubscriptionId>,
    ) -> TurnstileResult<MembershipId> {
        let outcome = self.pool.with_writer(|conn| {
            let plan = storage::plans::get_plan(conn, plan_id)?
                .ok_or(TurnstileError::PlanNotFound { plan_id })?;
            if !plan.is_active() {
                return Err(TurnstileError::InactivePlan { plan_id });
            }

            if let Some(existing) =
                storage::memberships::latest_for_user_plan(conn, user_id, plan_id)?
            {
                if existing.is_active() {
                    let id = extend_on_conn(conn, &existing, &plan, Utc::now())?;
                    return Ok(GrantOutcome::Extended(id));
                }
            }

            let now = Utc::now();
            let new = storage::memberships::NewMembership {
                user_id,
                plan_id,
                order_id,
                subscription_id,
                source,
                start_date: now,
                end_date: plan.expiration_from(now),
            };
            let id = storage::memberships::insert_membership(conn, &new, now)?;
            Ok(GrantOutcome::Created(
                id,
                MembershipEvent {
                    membership_id: id,
                    user_id,
                    plan_id,
                },
            ))
        })?;

        match outcome {
            GrantOutcome::Created(id, event) => {
                info!(
                    membership_id = id,
                    user_id,
                    plan_id,
                    source = source.as_str(),
                    "Membership granted"
                );
                self.hub.notify_granted(event);
                Ok(id)
            }
            GrantOutcome::Extended(id) => {
                info!(membership_id = id, user_id, plan_id, "Grant extended existing membership");
                Ok(id)
            }
        }
    }

    /// Stack one plan duration onto the membership's current end date
    /// (or onto now, when currently unbounded) and force it active.
    ///
    /// This is the renewal path: durations accumulate from the existing
    /// expiration, they never reset to "now + duration".
    pub fn extend(&self, membership_id: MembershipId) -> TurnstileResult<MembershipId> {
        self.pool.with_writer(|conn| {
            let membership = storage::memberships::get_membership(conn, membership_id)?
                .ok_or(TurnstileError::MembershipNotFound { membership_id })?;
            let plan = storage::plans::get_plan(conn, membership.plan_id)?.ok_or(
                TurnstileError::PlanNotFound {
                    plan_id: membership.plan_id,
                },
            )?;
            extend_on_conn(conn, &membership, &plan, Utc::now())
        })
    }

    /// Cancel the user's most recent membership for the plan,
    /// regardless of its status. Returns false when the user never held
    /// the plan.
    pub fn revoke(&self, user_id: UserId, plan_id: PlanId) -> TurnstileResult<bool> {
        let event = self.pool.with_writer(|conn| {
            let Some(membership) =
                storage::memberships::latest_for_user_plan(conn, user_id, plan_id)?
            else {
                return Ok(None);
            };
            storage::memberships::update_status(
                conn,
                membership.id,
                MembershipStatus::Cancelled,
                Utc::now(),
            )?;
            Ok(Some(MembershipEvent {
                membership_id: membership.id,
                user_id,
                plan_id,
            }))
        })?;

        match event {
            Some(event) => {
                info!(membership_id = event.membership_id, user_id, plan_id, "Membership revoked");
                self.hub.notify_revoked(event);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Put a membership on hold. Returns false for an unknown id.
    pub fn pause(&self, membership_id: MembershipId) -> TurnstileResult<bool> {
        let changed = self.pool.with_writer(|conn| {
            storage::memberships::update_status(
                conn,
                membership_id,
                MembershipStatus::Paused,
                Utc::now(),
            )
        })?;
        if changed {
            info!(membership_id, "Membership paused");
        }
        Ok(changed)
    }

    /// Lift a hold. No date recalculation. Returns false for an unknown
    /// id.
    pub fn resume(&self, membership_id: MembershipId) -> TurnstileResult<bool> {
        let changed = self.pool.with_writer(|conn| {
            storage::memberships::update_status(
                conn,
                membership_id,
                MembershipStatus::Active,
                Utc::now(),
            )
        })?;
        if changed {
            info!(membership_id, "Membership resumed");
        }
        Ok(changed)
    }

    /// Transition a membership to expired and notify subscribers.
    /// Returns false for an unknown id.
    pub fn expire(&self, membership_id: MembershipId) -> TurnstileResult<bool> {
        let event = self.pool.with_writer(|conn| {
            let Some(membership) = storage::memberships::get_membership(conn, membership_id)?
            else {
                return Ok(None);
            };
            storage::memberships::update_status(
                conn,
                membership_id,
                MembershipStatus::Expired,
                Utc::now(),
            )?;
            Ok(Some(MembershipEvent {
                membership_id,
                user_id: membership.user_id,
                plan_id: membership.plan_id,
            }))
        })?;

        match event {
            Some(event) => {
                info!(
                    membership_id = event.membership_id,
                    user_id = event.user_id,
                    plan_id = event.plan_id,
                    "Membership expired"
                );
                self.hub.notify_expired(event);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Shared extension arithmetic for grant-fallthrough and explicit
/// extend: new end = plan duration added to the current end date, or to
/// now when the membership is unbounded.
fn extend_on_conn(
    conn: &rusqlite::Connection,
    membership: &Membership,
    plan: &Plan,
    now: DateTime<Utc>,
) -> TurnstileResult<MembershipId> {
    let start_from = membership.end_date.unwrap_or(now);
    let new_end = plan.expiration_from(start_from);
    storage::memberships::update_extension(conn, membership.id, new_end, now)?;
    info!(
        membership_id = membership.id,
        new_end = ?new_end,
        "Membership extended"
    );
    Ok(membership.id)
}
