//! Content rule index: which plans restrict which content items.
//!
//! Writes use the replace-set pattern: saving either side of the
//! association (the content item's restriction list or the plan's
//! content list) replaces that owner's full set transactionally.

use std::sync::Arc;

use chrono::Utc;
use turnstile_core::models::ContentRule;
use turnstile_core::types::{ContentId, PlanId};

use crate::errors::TurnstileResult;
use crate::storage::{self, ConnectionPool};

#[derive(Clone)]
pub struct ContentRuleIndex {
    pool: Arc<ConnectionPool>,
}

impl ContentRuleIndex {
    pub(crate) fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Plan ids restricting a content item, in rule order. Empty means
    /// unrestricted.
    pub fn required_plans(&self, content_id: ContentId) -> TurnstileResult<Vec<PlanId>> {
        self.pool
            .with_reader(|conn| storage::rules::plan_ids_for_content(conn, content_id))
    }

    pub fn is_restricted(&self, content_id: ContentId) -> TurnstileResult<bool> {
        self.pool
            .with_reader(|conn| storage::rules::is_restricted(conn, content_id))
    }

    pub fn rules_for_content(&self, content_id: ContentId) -> TurnstileResult<Vec<ContentRule>> {
        self.pool
            .with_reader(|conn| storage::rules::rules_for_content(conn, content_id))
    }

    pub fn rules_for_plan(&self, plan_id: PlanId) -> TurnstileResult<Vec<ContentRule>> {
        self.pool
            .with_reader(|conn| storage::rules::rules_for_plan(conn, plan_id))
    }

    /// Replace a content item's restriction set.
    pub fn set_for_content(
        &self,
        content_id: ContentId,
        content_type: &str,
        plan_ids: &[PlanId],
    ) -> TurnstileResult<()> {
        self.pool.with_writer(|conn| {
            storage::rules::replace_for_content(conn, content_id, content_type, plan_ids, Utc::now())
        })
    }

    /// Replace a plan's restricted-content set.
    pub fn set_for_plan(
        &self,
        plan_id: PlanId,
        contents: &[(ContentId, &str)],
    ) -> TurnstileResult<()> {
        self.pool
            .with_writer(|conn| storage::rules::replace_for_plan(conn, plan_id, contents, Utc::now()))
    }

    /// Drop every rule for a deleted content item.
    pub fn remove_for_content(&self, content_id: ContentId) -> TurnstileResult<bool> {
        self.pool
            .with_writer(|conn| storage::rules::remove_all_for_content(conn, content_id))
    }
}
