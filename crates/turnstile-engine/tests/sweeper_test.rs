//! Expiration sweeper integration tests.

mod common;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use chrono::{Duration, Utc};
use common::{make_plan, runtime, runtime_with};
use turnstile_core::config::EngineConfig;
use turnstile_core::events::{MembershipEvent, MembershipObserver};
use turnstile_core::models::{DurationPolicy, MembershipSource, MembershipStatus};

#[test]
fn test_sweep_expires_only_lapsed_memberships() {
    let rt = runtime();
    let trial = make_plan(&rt, "Trial", DurationPolicy::Days(1));
    let annual = make_plan(&rt, "Annual", DurationPolicy::Years(1));
    let lifetime = make_plan(&rt, "Lifetime", DurationPolicy::Forever);
    let lifecycle = rt.lifecycle();

    let trial_id = lifecycle
        .grant(1, trial.id, MembershipSource::Manual, None, None)
        .unwrap();
    let annual_id = lifecycle
        .grant(1, annual.id, MembershipSource::Manual, None, None)
        .unwrap();
    let lifetime_id = lifecycle
        .grant(1, lifetime.id, MembershipSource::Manual, None, None)
        .unwrap();

    let report = rt.sweeper().sweep_at(Utc::now() + Duration::days(3)).unwrap();
    assert_eq!(report.checked, 1);
    assert_eq!(report.expired, 1);
    assert_eq!(report.failed, 0);

    let ledger = rt.ledger();
    assert_eq!(ledger.get(trial_id).unwrap().unwrap().status, MembershipStatus::Expired);
    assert_eq!(ledger.get(annual_id).unwrap().unwrap().status, MembershipStatus::Active);
    assert_eq!(ledger.get(lifetime_id).unwrap().unwrap().status, MembershipStatus::Active);
}

#[test]
fn test_sweep_is_idempotent() {
    let rt = runtime();
    let trial = make_plan(&rt, "Trial", DurationPolicy::Days(1));
    rt.lifecycle()
        .grant(1, trial.id, MembershipSource::Manual, None, None)
        .unwrap();

    let later = Utc::now() + Duration::days(2);
    let first = rt.sweeper().sweep_at(later).unwrap();
    assert_eq!(first.expired, 1);

    // Immediate second pass finds nothing new.
    let second = rt.sweeper().sweep_at(later).unwrap();
    assert_eq!(second.checked, 0);
    assert_eq!(second.expired, 0);
}

#[test]
fn test_sweep_disabled_by_config() {
    let rt = runtime_with(EngineConfig {
        expiration_check_enabled: false,
        ..EngineConfig::default()
    });
    let trial = make_plan(&rt, "Trial", DurationPolicy::Days(1));
    let id = rt
        .lifecycle()
        .grant(1, trial.id, MembershipSource::Manual, None, None)
        .unwrap();

    let report = rt.sweeper().sweep_at(Utc::now() + Duration::days(2)).unwrap();
    assert_eq!(report.checked, 0);
    assert_eq!(
        rt.ledger().get(id).unwrap().unwrap().status,
        MembershipStatus::Active
    );
}

#[test]
fn test_sweep_skips_paused_and_cancelled_rows() {
    let rt = runtime();
    let trial = make_plan(&rt, "Trial", DurationPolicy::Days(1));
    let lifecycle = rt.lifecycle();

    let paused = lifecycle
        .grant(1, trial.id, MembershipSource::Manual, None, None)
        .unwrap();
    lifecycle.pause(paused).unwrap();

    let cancelled = lifecycle
        .grant(2, trial.id, MembershipSource::Manual, None, None)
        .unwrap();
    lifecycle.revoke(2, trial.id).unwrap();

    let report = rt.sweeper().sweep_at(Utc::now() + Duration::days(2)).unwrap();
    assert_eq!(report.checked, 0);

    let ledger = rt.ledger();
    assert_eq!(ledger.get(paused).unwrap().unwrap().status, MembershipStatus::Paused);
    assert_eq!(ledger.get(cancelled).unwrap().unwrap().status, MembershipStatus::Cancelled);
}

#[test]
fn test_sweep_emits_expired_notifications() {
    #[derive(Default)]
    struct ExpiredCounter(AtomicU32);

    impl MembershipObserver for ExpiredCounter {
        fn on_expired(&self, _event: &MembershipEvent) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let rt = runtime();
    let observer = Arc::new(ExpiredCounter::default());
    rt.subscribe(observer.clone());

    let trial = make_plan(&rt, "Trial", DurationPolicy::Days(1));
    rt.lifecycle()
        .grant(1, trial.id, MembershipSource::Manual, None, None)
        .unwrap();
    rt.lifecycle()
        .grant(2, trial.id, MembershipSource::Manual, None, None)
        .unwrap();

    rt.sweeper().sweep_at(Utc::now() + Duration::days(2)).unwrap();
    assert_eq!(observer.0.load(Ordering::SeqCst), 2);
}
