//! Expiration sweeper: transitions lapsed memberships to expired.
//!
//! Invoked by whatever external scheduler the host runs (daily by
//! convention). One pass per invocation; per-item failures are logged
//! and skipped, never retried until the next scheduled run.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::errors::TurnstileResult;
use crate::lifecycle::LifecycleEngine;
use crate::storage::{self, ConnectionPool};

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Lapsed memberships found.
    pub checked: usize,
    /// Successfully transitioned to expired.
    pub expired: usize,
    /// Skipped due to a per-item failure (e.g. row vanished mid-sweep).
    pub failed: usize,
}

#[derive(Clone)]
pub struct ExpirationSweeper {
    pool: Arc<ConnectionPool>,
    lifecycle: LifecycleEngine,
    enabled: bool,
}

impl ExpirationSweeper {
    pub(crate) fn new(pool: Arc<ConnectionPool>, lifecycle: LifecycleEngine, enabled: bool) -> Self {
        Self {
            pool,
            lifecycle,
            enabled,
        }
    }

    /// Run one sweep pass at the current instant.
    pub fn sweep(&self) -> TurnstileResult<SweepReport> {
        self.sweep_at(Utc::now())
    }

    /// Time-parameterized sweep. Idempotent: a second pass at the same
    /// instant finds nothing left to expire.
    pub fn sweep_at(&self, now: DateTime<Utc>) -> TurnstileResult<SweepReport> {
        if !self.enabled {
            debug!("Expiration sweep disabled by configuration");
            return Ok(SweepReport::default());
        }

        let lapsed = self
            .pool
            .with_reader(|conn| storage::memberships::lapsed_active(conn, now))?;

        let mut report = SweepReport {
            checked: lapsed.len(),
            ..SweepReport::default()
        };

        for membership in lapsed {
            match self.lifecycle.expire(membership.id) {
                Ok(true) => report.expired += 1,
                Ok(false) => {
                    // Row removed between the query and the transition.
                    report.failed += 1;
                }
                Err(e) => {
                    warn!(
                        membership_id = membership.id,
                        error = %e,
                        "Failed to expire membership — continuing sweep"
                    );
                    report.failed += 1;
                }
            }
        }

        info!(
            checked = report.checked,
            expired = report.expired,
            failed = report.failed,
            "Expiration sweep complete"
        );
        Ok(report)
    }
}
