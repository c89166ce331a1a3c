//! CommerceAdapter: maps order and subscription signals to lifecycle
//! engine calls through the plan-product index.
//!
//! Handlers never raise to the commerce platform: a missing plan
//! mapping, an inactive plan, or a vanished membership is logged and
//! skipped, and processing continues with the next item. Failures are
//! counted and exposed via `error_count()` so monitoring can detect
//! silent breakage.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};
use turnstile_core::config::EngineConfig;
use turnstile_core::models::MembershipSource;
use turnstile_core::types::{OrderId, PlanId, SubscriptionId, UserId};

use super::dedup::EventDeduplicator;
use super::events::{OrderSnapshot, SubscriptionSnapshot, SubscriptionStatus};
use crate::errors::TurnstileError;
use crate::lifecycle::LifecycleEngine;
use crate::storage::{self, ConnectionPool};

pub struct CommerceAdapter {
    pool: Arc<ConnectionPool>,
    lifecycle: LifecycleEngine,
    config: EngineConfig,
    dedup: Mutex<EventDeduplicator>,
    /// Count of failures during event processing, for monitoring.
    error_count: AtomicU64,
}

impl CommerceAdapter {
    pub(crate) fn new(
        pool: Arc<ConnectionPool>,
        lifecycle: LifecycleEngine,
        config: EngineConfig,
    ) -> Self {
        let ttl = Duration::from_secs(config.dedup_ttl_secs);
        Self {
            pool,
            lifecycle,
            config,
            dedup: Mutex::new(EventDeduplicator::new(ttl)),
            error_count: AtomicU64::new(0),
        }
    }

    /// Failures observed so far (storage errors, not expected
    /// rejections like an unmapped product).
    pub fn error_count(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    // ── Orders ──

    /// Order reached completed. Grants one membership per plan mapped
    /// to a purchased product. Returns the number of grants performed;
    /// zero for a duplicate delivery (the durable order marker has
    /// already been claimed).
    pub fn on_order_completed(&self, order: &OrderSnapshot) -> usize {
        if !self.config.auto_grant_on_complete {
            debug!(order_id = order.order_id, "Auto-grant on completion disabled");
            return 0;
        }
        self.process_order(order)
    }

    /// Order reached processing. Virtual-only orders are granted
    /// immediately rather than waiting for completion.
    pub fn on_order_processing(&self, order: &OrderSnapshot) -> usize {
        if !order.all_virtual {
            return 0;
        }
        self.process_order(order)
    }

    fn process_order(&self, order: &OrderSnapshot) -> usize {
        let Some(user_id) = order.user_id else {
            debug!(order_id = order.order_id, "Order has no buyer — nothing to grant");
            return 0;
        };

        // Claim the idempotency marker before granting, so a retried
        // webhook finds it claimed and does not stack a second grant.
        let claimed = self
            .pool
            .with_writer(|conn| storage::orders::claim_order(conn, order.order_id, Utc::now()));
        match claimed {
            Ok(true) => {}
            Ok(false) => {
                debug!(order_id = order.order_id, "Order already processed — skipping");
                return 0;
            }
            Err(e) => {
                self.record_failure("claim_order", &e);
                return 0;
            }
        }

        let mut granted = 0;
        for &product_id in &order.product_ids {
            for plan_id in self.plans_for_product(product_id) {
                let result = self.lifecycle.grant(
                    user_id,
                    plan_id,
                    MembershipSource::Purchase,
                    Some(order.order_id),
                    None,
                );
                match result {
                    Ok(membership_id) => {
                        info!(
                            order_id = order.order_id,
                            membership_id, plan_id, "Order grant applied"
                        );
                        granted += 1;
                    }
                    Err(e) => self.skip_or_record("order grant", plan_id, &e),
                }
            }
        }
        granted
    }

    /// Order refunded (partially or fully). Revokes per mapped plan.
    pub fn on_order_refunded(&self, order: &OrderSnapshot) -> usize {
        if !self.config.revoke_on_refund {
            debug!(order_id = order.order_id, "Revoke on refund disabled");
            return 0;
        }
        let Some(user_id) = order.user_id else {
            return 0;
        };

        let mut revoked = 0;
        for &product_id in &order.product_ids {
            for plan_id in self.plans_for_product(product_id) {
                match self.lifecycle.revoke(user_id, plan_id) {
                    Ok(true) => {
                        info!(order_id = order.order_id, plan_id, "Refund revoke applied");
                        revoked += 1;
                    }
                    Ok(false) => {
                        debug!(order_id = order.order_id, plan_id, "No membership to revoke");
                    }
                    Err(e) => self.skip_or_record("refund revoke", plan_id, &e),
                }
            }
        }
        revoked
    }

    // ── Subscriptions ──

    /// Dispatch a subscription status change. Returns the number of
    /// memberships affected.
    pub fn on_subscription_status_changed(
        &self,
        subscription: &SubscriptionSnapshot,
        status: SubscriptionStatus,
    ) -> usize {
        match status {
            SubscriptionStatus::Active => self.on_subscription_activated(subscription),
            SubscriptionStatus::OnHold => {
                usize::from(self.on_subscription_on_hold(subscription.subscription_id))
            }
            SubscriptionStatus::Cancelled => self.on_subscription_cancelled(subscription),
            SubscriptionStatus::Expired => {
                usize::from(self.on_subscription_expired(subscription.subscription_id))
            }
            // Membership remains active until the subscription actually ends.
            SubscriptionStatus::PendingCancel => 0,
        }
    }

    /// Subscription became active: resume the membership already tied
    /// to this subscription when its plan matches, otherwise grant a
    /// fresh one.
    pub fn on_subscription_activated(&self, subscription: &SubscriptionSnapshot) -> usize {
        let Some(user_id) = subscription.user_id else {
            debug!(
                subscription_id = subscription.subscription_id,
                "Subscription has no user — nothing to grant"
            );
            return 0;
        };

        let mut affected = 0;
        for &product_id in &subscription.product_ids {
            for plan_id in self.plans_for_product(product_id) {
                affected += usize::from(self.activate_plan(subscription, user_id, plan_id));
            }
        }
        affected
    }

    fn activate_plan(
        &self,
        subscription: &SubscriptionSnapshot,
        user_id: UserId,
        plan_id: PlanId,
    ) -> bool {
        let existing = self.pool.with_reader(|conn| {
            storage::memberships::get_by_subscription(conn, subscription.subscription_id)
        });
        let existing = match existing {
            Ok(existing) => existing,
            Err(e) => {
                self.record_failure("subscription lookup", &e);
                return false;
            }
        };

        if let Some(membership) = existing {
            if membership.plan_id == plan_id {
                return match self.lifecycle.resume(membership.id) {
                    Ok(resumed) => resumed,
                    Err(e) => {
                        self.skip_or_record("subscription resume", plan_id, &e);
                        false
                    }
                };
            }
        }

        let result = self.lifecycle.grant(
            user_id,
            plan_id,
            MembershipSource::Subscription,
            None,
            Some(subscription.subscription_id),
        );
        match result {
            Ok(membership_id) => {
                info!(
                    subscription_id = subscription.subscription_id,
                    membership_id, plan_id, "Subscription grant applied"
                );
                true
            }
            Err(e) => {
                self.skip_or_record("subscription grant", plan_id, &e);
                false
            }
        }
    }

    /// Subscription put on hold: pause the linked membership.
    pub fn on_subscription_on_hold(&self, subscription_id: SubscriptionId) -> bool {
        self.with_linked_membership(subscription_id, "pause", |id| self.lifecycle.pause(id))
    }

    /// Subscription cancelled: revoke by (user, plan) for each mapped
    /// plan.
    pub fn on_subscription_cancelled(&self, subscription: &SubscriptionSnapshot) -> usize {
        let Some(user_id) = subscription.user_id else {
            return 0;
        };

        let mut revoked = 0;
        for &product_id in &subscription.product_ids {
            for plan_id in self.plans_for_product(product_id) {
                match self.lifecycle.revoke(user_id, plan_id) {
                    Ok(true) => revoked += 1,
                    Ok(false) => {
                        debug!(
                            subscription_id = subscription.subscription_id,
                            plan_id, "No membership to revoke"
                        );
                    }
                    Err(e) => self.skip_or_record("subscription revoke", plan_id, &e),
                }
            }
        }
        revoked
    }

    /// Subscription expired: expire the linked membership directly,
    /// bypassing the date-based sweeper.
    pub fn on_subscription_expired(&self, subscription_id: SubscriptionId) -> bool {
        self.with_linked_membership(subscription_id, "expire", |id| self.lifecycle.expire(id))
    }

    /// Renewal payment complete: stack one plan duration onto the
    /// linked membership's end date and reactivate it.
    pub fn on_renewal_complete(&self, subscription_id: SubscriptionId) -> bool {
        if self.is_duplicate("renewal_complete", subscription_id) {
            debug!(subscription_id, "Duplicate renewal notification — skipping");
            return false;
        }

        let membership = self
            .pool
            .with_reader(|conn| storage::memberships::get_by_subscription(conn, subscription_id));
        let membership = match membership {
            Ok(Some(membership)) => membership,
            Ok(None) => {
                debug!(subscription_id, "Renewal for unknown subscription — skipping");
                return false;
            }
            Err(e) => {
                self.record_failure("renewal lookup", &e);
                return false;
            }
        };

        match self.lifecycle.extend(membership.id) {
            Ok(_) => {
                info!(subscription_id, membership_id = membership.id, "Renewal extension applied");
                true
            }
            Err(e) => {
                self.skip_or_record("renewal extend", membership.plan_id, &e);
                false
            }
        }
    }

    /// Renewal payment failed: put the linked membership on hold.
    pub fn on_renewal_failed(&self, subscription_id: SubscriptionId) -> bool {
        self.with_linked_membership(subscription_id, "renewal-failed pause", |id| {
            self.lifecycle.pause(id)
        })
    }

    // ── Helpers ──

    fn plans_for_product(&self, product_id: i64) -> Vec<PlanId> {
        match self
            .pool
            .with_reader(|conn| storage::products::plans_for_product(conn, product_id))
        {
            Ok(plan_ids) => plan_ids,
            Err(e) => {
                self.record_failure("plan-product lookup", &e);
                Vec::new()
            }
        }
    }

    fn with_linked_membership<F>(
        &self,
        subscription_id: SubscriptionId,
        action: &str,
        f: F,
    ) -> bool
    where
        F: FnOnce(i64) -> Result<bool, TurnstileError>,
    {
        let membership = self
            .pool
            .with_reader(|conn| storage::memberships::get_by_subscription(conn, subscription_id));
        match membership {
            Ok(Some(membership)) => match f(membership.id) {
                Ok(changed) => changed,
                Err(e) => {
                    self.skip_or_record(action, membership.plan_id, &e);
                    false
                }
            },
            Ok(None) => {
                debug!(subscription_id, action, "No membership linked to subscription");
                false
            }
            Err(e) => {
                self.record_failure(action, &e);
                false
            }
        }
    }

    fn is_duplicate(&self, kind: &str, entity_id: i64) -> bool {
        match self.dedup.lock() {
            Ok(mut dedup) => dedup.is_duplicate(kind, entity_id),
            Err(_) => false, // Poisoned lock — allow event through
        }
    }

    /// Expected rejections (unmapped plan, inactive plan, vanished
    /// membership) are debug noise; anything else counts as a failure.
    fn skip_or_record(&self, action: &str, plan_id: PlanId, error: &TurnstileError) {
        if error.is_not_found() || matches!(error, TurnstileError::InactivePlan { .. }) {
            debug!(action, plan_id, error = %error, "Skipping commerce item");
        } else {
            self.record_failure(action, error);
        }
    }

    fn record_failure(&self, action: &str, error: &TurnstileError) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
        warn!(
            action,
            error = %error,
            total_errors = self.error_count.load(Ordering::Relaxed),
            "Commerce event processing failure — continuing"
        );
    }

    /// Whether an order's idempotency marker has been claimed. Lets a
    /// host inspect replay state without re-sending the event.
    pub fn is_order_processed(&self, order_id: OrderId) -> Result<bool, TurnstileError> {
        self.pool
            .with_reader(|conn| storage::orders::is_order_processed(conn, order_id))
    }
}
