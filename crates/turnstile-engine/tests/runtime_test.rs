//! Runtime + file-backed storage tests.

mod common;

use common::init_tracing;
use turnstile_core::config::EngineConfig;
use turnstile_core::models::{DurationPolicy, MembershipSource};
use turnstile_engine::catalog::NewPlan;
use turnstile_engine::storage::ConnectionPool;
use turnstile_engine::TurnstileRuntime;

#[test]
fn test_state_survives_reopen() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("memberships.db");

    let plan_id = {
        let rt = TurnstileRuntime::open(&db_path, EngineConfig::default()).unwrap();
        let plan = rt
            .catalog()
            .create(NewPlan::new("Gold", DurationPolicy::Months(1)))
            .unwrap();
        rt.lifecycle()
            .grant(1, plan.id, MembershipSource::Manual, None, None)
            .unwrap();
        rt.rules().set_for_content(42, "post", &[plan.id]).unwrap();
        plan.id
    };

    // Reopen: migrations are a no-op, data is intact, reads go through
    // the reader pool.
    let rt = TurnstileRuntime::open(&db_path, EngineConfig::default()).unwrap();
    let plan = rt.catalog().get(plan_id).unwrap().unwrap();
    assert_eq!(plan.slug, "gold");
    assert!(rt.ledger().user_has_plan(1, plan_id).unwrap());
    assert!(!rt.access().can_access(42, None).unwrap());
    assert!(rt.access().can_access(42, Some(1)).unwrap());
}

#[test]
fn test_file_backed_pool_uses_wal() {
    let dir = tempfile::tempdir().unwrap();
    let pool = ConnectionPool::open(&dir.path().join("wal.db"), 2).unwrap();
    assert!(pool.is_wal_mode());
}

#[test]
fn test_reader_pool_observes_writes() {
    let dir = tempfile::tempdir().unwrap();
    let rt = TurnstileRuntime::open(&dir.path().join("pool.db"), EngineConfig::default()).unwrap();

    let plan = rt
        .catalog()
        .create(NewPlan::new("Gold", DurationPolicy::Forever))
        .unwrap();

    // list() round-robins across readers; every reader must see the
    // committed write.
    for _ in 0..4 {
        assert_eq!(rt.catalog().list(false).unwrap().len(), 1);
    }
    assert_eq!(rt.catalog().get(plan.id).unwrap().unwrap().name, "Gold");
}
