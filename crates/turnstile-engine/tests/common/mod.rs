//! Shared helpers for the integration suites.
#![allow(dead_code)] // not every suite uses every helper

use turnstile_core::config::EngineConfig;
use turnstile_core::models::{DurationPolicy, Plan};
use turnstile_engine::catalog::NewPlan;
use turnstile_engine::TurnstileRuntime;

/// Install a test subscriber so RUST_LOG=debug surfaces engine traces.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn runtime() -> TurnstileRuntime {
    runtime_with(EngineConfig::default())
}

pub fn runtime_with(config: EngineConfig) -> TurnstileRuntime {
    init_tracing();
    TurnstileRuntime::open_in_memory(config).unwrap()
}

pub fn make_plan(runtime: &TurnstileRuntime, name: &str, duration: DurationPolicy) -> Plan {
    runtime.catalog().create(NewPlan::new(name, duration)).unwrap()
}
