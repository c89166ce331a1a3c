//! # turnstile-engine
//!
//! SQLite-backed implementation of the Turnstile membership core.
//!
//! ## Modules
//! - `access` — access evaluator, admin capability probe
//! - `catalog` — plan CRUD, slug handling, delete orchestration
//! - `commerce` — order/subscription event adapter, dedup
//! - `errors` — `TurnstileError`, `TurnstileResult`
//! - `ledger` — host-facing membership reads
//! - `lifecycle` — grant/extend/revoke/pause/resume/expire
//! - `product_index` — plan ↔ product associations
//! - `rule_index` — content ↔ plan restriction rules
//! - `storage` — PRAGMAs, schema, migrations, pool, table queries
//! - `sweeper` — periodic expiration pass

pub mod access;
pub mod catalog;
pub mod commerce;
pub mod errors;
pub mod ledger;
pub mod lifecycle;
pub mod product_index;
pub mod rule_index;
pub mod storage;
pub mod sweeper;

use std::path::Path;
use std::sync::Arc;

use tracing::info;
use turnstile_core::config::EngineConfig;
use turnstile_core::events::{MembershipObserver, NotificationHub};

use access::{AccessEvaluator, AdminProbe, NoAdmins};
use catalog::PlanCatalog;
use commerce::CommerceAdapter;
use errors::TurnstileResult;
use ledger::MembershipLedger;
use lifecycle::LifecycleEngine;
use product_index::PlanProductIndex;
use rule_index::ContentRuleIndex;
use storage::ConnectionPool;
use sweeper::ExpirationSweeper;

/// The engine runtime: owns the connection pool, configuration, the
/// notification hub, and the host's admin probe, and hands out the
/// service components.
pub struct TurnstileRuntime {
    pool: Arc<ConnectionPool>,
    config: EngineConfig,
    hub: Arc<NotificationHub>,
    admins: Arc<dyn AdminProbe>,
}

impl TurnstileRuntime {
    /// Open (or create) a file-backed membership database and run
    /// migrations.
    pub fn open(path: &Path, config: EngineConfig) -> TurnstileResult<Self> {
        let pool = ConnectionPool::open(path, config.read_pool_size)?;
        pool.with_writer(|conn| storage::migrate(conn).map(|_| ()))?;
        info!(path = %path.display(), "Turnstile runtime initialized");
        Ok(Self {
            pool: Arc::new(pool),
            config,
            hub: Arc::new(NotificationHub::new()),
            admins: Arc::new(NoAdmins),
        })
    }

    /// Open an in-memory runtime (tests, ephemeral hosts).
    pub fn open_in_memory(config: EngineConfig) -> TurnstileResult<Self> {
        let pool = ConnectionPool::open_in_memory()?;
        pool.with_writer(|conn| storage::migrate(conn).map(|_| ()))?;
        Ok(Self {
            pool: Arc::new(pool),
            config,
            hub: Arc::new(NotificationHub::new()),
            admins: Arc::new(NoAdmins),
        })
    }

    /// Install the host's administrator capability probe.
    pub fn with_admin_probe(mut self, admins: Arc<dyn AdminProbe>) -> Self {
        self.admins = admins;
        self
    }

    /// Register a lifecycle notification observer.
    pub fn subscribe(&self, observer: Arc<dyn MembershipObserver>) {
        self.hub.subscribe(observer);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> PlanCatalog {
        PlanCatalog::new(self.pool.clone())
    }

    pub fn ledger(&self) -> MembershipLedger {
        MembershipLedger::new(self.pool.clone())
    }

    pub fn rules(&self) -> ContentRuleIndex {
        ContentRuleIndex::new(self.pool.clone())
    }

    pub fn products(&self) -> PlanProductIndex {
        PlanProductIndex::new(self.pool.clone())
    }

    pub fn lifecycle(&self) -> LifecycleEngine {
        LifecycleEngine::new(self.pool.clone(), self.hub.clone())
    }

    pub fn access(&self) -> AccessEvaluator {
        AccessEvaluator::new(self.pool.clone(), self.admins.clone())
    }

    pub fn sweeper(&self) -> ExpirationSweeper {
        ExpirationSweeper::new(
            self.pool.clone(),
            self.lifecycle(),
            self.config.expiration_check_enabled,
        )
    }

    pub fn commerce(&self) -> CommerceAdapter {
        CommerceAdapter::new(self.pool.clone(), self.lifecycle(), self.config.clone())
    }
}
