//! Lifecycle engine integration tests: the state machine, idempotent
//! re-grants, duration stacking, and notifications.

mod common;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use chrono::{Duration, Months};
use common::{make_plan, runtime};
use turnstile_core::events::{MembershipEvent, MembershipObserver};
use turnstile_core::models::{DurationPolicy, MembershipSource, MembershipStatus, PlanStatus};
use turnstile_engine::catalog::NewPlan;
use turnstile_engine::errors::TurnstileError;

#[derive(Default)]
struct CountingObserver {
    granted: AtomicU32,
    revoked: AtomicU32,
    expired: AtomicU32,
}

impl MembershipObserver for CountingObserver {
    fn on_granted(&self, _event: &MembershipEvent) {
        self.granted.fetch_add(1, Ordering::SeqCst);
    }
    fn on_revoked(&self, _event: &MembershipEvent) {
        self.revoked.fetch_add(1, Ordering::SeqCst);
    }
    fn on_expired(&self, _event: &MembershipEvent) {
        self.expired.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_grant_creates_active_membership_with_computed_end() {
    let rt = runtime();
    let plan = make_plan(&rt, "Gold", DurationPolicy::Days(30));

    let id = rt
        .lifecycle()
        .grant(1, plan.id, MembershipSource::Manual, None, None)
        .unwrap();

    let membership = rt.ledger().get(id).unwrap().unwrap();
    assert_eq!(membership.status, MembershipStatus::Active);
    assert_eq!(membership.source, MembershipSource::Manual);
    assert_eq!(
        membership.end_date.unwrap(),
        membership.start_date + Duration::days(30)
    );
    assert!(membership.cancelled_at.is_none());
}

#[test]
fn test_grant_forever_plan_has_no_end() {
    let rt = runtime();
    let plan = make_plan(&rt, "Lifetime", DurationPolicy::Forever);
    let id = rt
        .lifecycle()
        .grant(1, plan.id, MembershipSource::Import, None, None)
        .unwrap();
    assert!(rt.ledger().get(id).unwrap().unwrap().end_date.is_none());
}

#[test]
fn test_grant_unknown_plan_rejected() {
    let rt = runtime();
    let err = rt
        .lifecycle()
        .grant(1, 999, MembershipSource::Manual, None, None)
        .unwrap_err();
    assert!(matches!(err, TurnstileError::PlanNotFound { plan_id: 999 }));
}

#[test]
fn test_grant_inactive_plan_rejected() {
    let rt = runtime();
    let mut new = NewPlan::new("Retired", DurationPolicy::Forever);
    new.status = PlanStatus::Inactive;
    let plan = rt.catalog().create(new).unwrap();

    let err = rt
        .lifecycle()
        .grant(1, plan.id, MembershipSource::Manual, None, None)
        .unwrap_err();
    assert!(matches!(err, TurnstileError::InactivePlan { .. }));
}

#[test]
fn test_double_grant_extends_instead_of_duplicating() {
    let rt = runtime();
    let plan = make_plan(&rt, "Gold", DurationPolicy::Days(30));
    let lifecycle = rt.lifecycle();

    let first = lifecycle
        .grant(1, plan.id, MembershipSource::Purchase, Some(500), None)
        .unwrap();
    let after_first = rt.ledger().get(first).unwrap().unwrap();

    let second = lifecycle
        .grant(1, plan.id, MembershipSource::Purchase, Some(501), None)
        .unwrap();
    assert_eq!(first, second);

    // Exactly one row, with the second period stacked onto the first.
    let history = rt.ledger().for_user(1, false).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(
        history[0].end_date.unwrap(),
        after_first.end_date.unwrap() + Duration::days(30)
    );
    assert_eq!(history[0].status, MembershipStatus::Active);
}

#[test]
fn test_extend_stacks_from_current_end_not_now() {
    let rt = runtime();
    let plan = make_plan(&rt, "Gold", DurationPolicy::Months(1));
    let lifecycle = rt.lifecycle();

    let id = lifecycle
        .grant(1, plan.id, MembershipSource::Subscription, None, Some(77))
        .unwrap();
    let before = rt.ledger().get(id).unwrap().unwrap();

    lifecycle.extend(id).unwrap();

    let after = rt.ledger().get(id).unwrap().unwrap();
    let expected = before
        .end_date
        .unwrap()
        .checked_add_months(Months::new(1))
        .unwrap();
    assert_eq!(after.end_date.unwrap(), expected);
}

#[test]
fn test_extend_reactivates_paused_membership() {
    let rt = runtime();
    let plan = make_plan(&rt, "Gold", DurationPolicy::Days(30));
    let lifecycle = rt.lifecycle();

    let id = lifecycle
        .grant(1, plan.id, MembershipSource::Manual, None, None)
        .unwrap();
    assert!(lifecycle.pause(id).unwrap());

    lifecycle.extend(id).unwrap();
    assert_eq!(
        rt.ledger().get(id).unwrap().unwrap().status,
        MembershipStatus::Active
    );
}

#[test]
fn test_extend_unknown_membership() {
    let rt = runtime();
    let err = rt.lifecycle().extend(999).unwrap_err();
    assert!(matches!(err, TurnstileError::MembershipNotFound { membership_id: 999 }));
}

#[test]
fn test_extend_orphaned_membership_reports_missing_plan() {
    let rt = runtime();
    let plan = make_plan(&rt, "Gold", DurationPolicy::Days(30));
    let id = rt
        .lifecycle()
        .grant(1, plan.id, MembershipSource::Manual, None, None)
        .unwrap();

    rt.catalog().delete(plan.id).unwrap();

    let err = rt.lifecycle().extend(id).unwrap_err();
    assert!(matches!(err, TurnstileError::PlanNotFound { .. }));
}

#[test]
fn test_revoke_marks_cancelled_with_timestamp() {
    let rt = runtime();
    let plan = make_plan(&rt, "Gold", DurationPolicy::Forever);
    let lifecycle = rt.lifecycle();

    let id = lifecycle
        .grant(1, plan.id, MembershipSource::Manual, None, None)
        .unwrap();
    assert!(lifecycle.revoke(1, plan.id).unwrap());

    let membership = rt.ledger().get(id).unwrap().unwrap();
    assert_eq!(membership.status, MembershipStatus::Cancelled);
    assert!(membership.cancelled_at.is_some());
}

#[test]
fn test_revoke_without_membership_is_noop() {
    let rt = runtime();
    let plan = make_plan(&rt, "Gold", DurationPolicy::Forever);
    assert!(!rt.lifecycle().revoke(1, plan.id).unwrap());
    assert!(rt.ledger().for_user(1, false).unwrap().is_empty());
}

#[test]
fn test_pause_and_resume() {
    let rt = runtime();
    let plan = make_plan(&rt, "Gold", DurationPolicy::Days(30));
    let lifecycle = rt.lifecycle();

    let id = lifecycle
        .grant(1, plan.id, MembershipSource::Manual, None, None)
        .unwrap();
    let before = rt.ledger().get(id).unwrap().unwrap();

    assert!(lifecycle.pause(id).unwrap());
    assert_eq!(rt.ledger().get(id).unwrap().unwrap().status, MembershipStatus::Paused);

    assert!(lifecycle.resume(id).unwrap());
    let after = rt.ledger().get(id).unwrap().unwrap();
    assert_eq!(after.status, MembershipStatus::Active);
    // No date recalculation on pause/resume.
    assert_eq!(after.end_date, before.end_date);

    assert!(!lifecycle.pause(999).unwrap());
    assert!(!lifecycle.resume(999).unwrap());
}

#[test]
fn test_expire_and_regrant_creates_new_record() {
    let rt = runtime();
    let plan = make_plan(&rt, "Gold", DurationPolicy::Days(30));
    let lifecycle = rt.lifecycle();

    let first = lifecycle
        .grant(1, plan.id, MembershipSource::Manual, None, None)
        .unwrap();
    assert!(lifecycle.expire(first).unwrap());
    assert_eq!(
        rt.ledger().get(first).unwrap().unwrap().status,
        MembershipStatus::Expired
    );

    // Terminal state: a new grant opens a fresh record.
    let second = lifecycle
        .grant(1, plan.id, MembershipSource::Manual, None, None)
        .unwrap();
    assert_ne!(first, second);
    assert_eq!(rt.ledger().for_user(1, false).unwrap().len(), 2);
    assert_eq!(rt.ledger().for_user(1, true).unwrap().len(), 1);
}

#[test]
fn test_expire_unknown_membership_returns_false() {
    let rt = runtime();
    assert!(!rt.lifecycle().expire(999).unwrap());
}

#[test]
fn test_notifications_fire_per_transition() {
    let rt = runtime();
    let observer = Arc::new(CountingObserver::default());
    rt.subscribe(observer.clone());

    let plan = make_plan(&rt, "Gold", DurationPolicy::Days(30));
    let lifecycle = rt.lifecycle();

    let id = lifecycle
        .grant(1, plan.id, MembershipSource::Manual, None, None)
        .unwrap();
    // Idempotent re-grant extends; no second granted notification.
    lifecycle
        .grant(1, plan.id, MembershipSource::Manual, None, None)
        .unwrap();
    lifecycle.expire(id).unwrap();
    lifecycle
        .grant(1, plan.id, MembershipSource::Manual, None, None)
        .unwrap();
    lifecycle.revoke(1, plan.id).unwrap();

    assert_eq!(observer.granted.load(Ordering::SeqCst), 2);
    assert_eq!(observer.expired.load(Ordering::SeqCst), 1);
    assert_eq!(observer.revoked.load(Ordering::SeqCst), 1);
}

#[test]
fn test_ledger_expiring_within_window() {
    let rt = runtime();
    let short = make_plan(&rt, "Trial", DurationPolicy::Days(5));
    let long = make_plan(&rt, "Annual", DurationPolicy::Years(1));
    let lifecycle = rt.lifecycle();

    let trial_id = lifecycle
        .grant(1, short.id, MembershipSource::Manual, None, None)
        .unwrap();
    lifecycle
        .grant(1, long.id, MembershipSource::Manual, None, None)
        .unwrap();

    let soon = rt.ledger().expiring_within(7).unwrap();
    assert_eq!(soon.len(), 1);
    assert_eq!(soon[0].id, trial_id);

    assert!(rt.ledger().expiring_within(3).unwrap().is_empty());
}

#[test]
fn test_ledger_remove_is_explicit_delete() {
    let rt = runtime();
    let plan = make_plan(&rt, "Gold", DurationPolicy::Forever);
    let id = rt
        .lifecycle()
        .grant(1, plan.id, MembershipSource::Manual, None, None)
        .unwrap();

    assert!(rt.ledger().remove(id).unwrap());
    assert!(rt.ledger().get(id).unwrap().is_none());
    assert!(!rt.ledger().remove(id).unwrap());
}
