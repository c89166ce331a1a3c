//! Plan catalog: create/read/update/delete for entitlement tiers.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use turnstile_core::models::{DurationPolicy, Plan, PlanStatus};
use turnstile_core::slug::slugify;
use turnstile_core::types::PlanId;

use crate::errors::{TurnstileError, TurnstileResult};
use crate::storage::{self, ConnectionPool};

/// Creation payload. Slug is optional; when absent it is derived from
/// the name.
#[derive(Debug, Clone)]
pub struct NewPlan {
    pub name: String,
    pub slug: Option<String>,
    pub description: String,
    pub duration: DurationPolicy,
    pub priority: i32,
    pub status: PlanStatus,
}

impl NewPlan {
    pub fn new(name: impl Into<String>, duration: DurationPolicy) -> Self {
        Self {
            name: name.into(),
            slug: None,
            description: String::new(),
            duration,
            priority: 0,
            status: PlanStatus::Active,
        }
    }
}

/// Partial update; unset fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct PlanUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub duration: Option<DurationPolicy>,
    pub priority: Option<i32>,
    pub status: Option<PlanStatus>,
}

#[derive(Clone)]
pub struct PlanCatalog {
    pool: Arc<ConnectionPool>,
}

impl PlanCatalog {
    pub(crate) fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Create a plan. Surfaces a duplicate slug as a typed error rather
    /// than silently renaming.
    pub fn create(&self, new: NewPlan) -> TurnstileResult<Plan> {
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(TurnstileError::Validation {
                field: "name",
                reason: "must not be empty".to_string(),
            });
        }
        validate_duration(new.duration)?;

        let slug = match new.slug.as_deref() {
            Some(supplied) if !supplied.trim().is_empty() => slugify(supplied),
            _ => slugify(&name),
        };
        if slug.is_empty() {
            return Err(TurnstileError::Validation {
                field: "slug",
                reason: "derived slug is empty".to_string(),
            });
        }

        let plan = self.pool.with_writer(|conn| {
            if storage::plans::slug_exists(conn, &slug, None)? {
                return Err(TurnstileError::DuplicateSlug { slug: slug.clone() });
            }
            let now = Utc::now();
            let id = storage::plans::insert_plan(
                conn,
                &name,
                &slug,
                &new.description,
                new.duration,
                new.priority,
                new.status,
                now,
            )?;
            storage::plans::get_plan(conn, id)?
                .ok_or(TurnstileError::PlanNotFound { plan_id: id })
        })?;

        info!(plan_id = plan.id, slug = %plan.slug, "Plan created");
        Ok(plan)
    }

    /// Apply a partial update. Changing the slug (directly, never
    /// implicitly via a rename) re-checks uniqueness against every
    /// other plan.
    pub fn update(&self, id: PlanId, update: PlanUpdate) -> TurnstileResult<Plan> {
        self.pool.with_writer(|conn| {
            let mut plan = storage::plans::get_plan(conn, id)?
                .ok_or(TurnstileError::PlanNotFound { plan_id: id })?;

            if let Some(name) = update.name {
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(TurnstileError::Validation {
                        field: "name",
                        reason: "must not be empty".to_string(),
                    });
                }
                plan.name = name;
            }
            if let Some(slug) = update.slug {
                let slug = slugify(&slug);
                if slug.is_empty() {
                    return Err(TurnstileError::Validation {
                        field: "slug",
                        reason: "derived slug is empty".to_string(),
                    });
                }
                if slug != plan.slug && storage::plans::slug_exists(conn, &slug, Some(id))? {
                    return Err(TurnstileError::DuplicateSlug { slug });
                }
                plan.slug = slug;
            }
            if let Some(description) = update.description {
                plan.description = description;
            }
            if let Some(duration) = update.duration {
                validate_duration(duration)?;
                plan.duration = duration;
            }
            if let Some(priority) = update.priority {
                plan.priority = priority;
            }
            if let Some(status) = update.status {
                plan.status = status;
            }

            storage::plans::update_plan(conn, &plan, Utc::now())?;
            storage::plans::get_plan(conn, id)?
                .ok_or(TurnstileError::PlanNotFound { plan_id: id })
        })
    }

    pub fn get(&self, id: PlanId) -> TurnstileResult<Option<Plan>> {
        self.pool.with_reader(|conn| storage::plans::get_plan(conn, id))
    }

    pub fn get_by_slug(&self, slug: &str) -> TurnstileResult<Option<Plan>> {
        self.pool
            .with_reader(|conn| storage::plans::get_plan_by_slug(conn, slug))
    }

    /// Plans ordered by priority descending, then name ascending.
    pub fn list(&self, active_only: bool) -> TurnstileResult<Vec<Plan>> {
        self.pool
            .with_reader(|conn| storage::plans::list_plans(conn, active_only))
    }

    /// Delete a plan and its content rules and product links in one
    /// transaction. Membership rows are kept for history, silently
    /// orphaned against the missing plan.
    pub fn delete(&self, id: PlanId) -> TurnstileResult<bool> {
        let deleted = self.pool.with_writer(|conn| {
            let tx = conn.unchecked_transaction()?;
            let deleted = storage::plans::delete_plan(&tx, id)?;
            if deleted {
                storage::rules::remove_all_for_plan(&tx, id)?;
                storage::products::remove_all_for_plan(&tx, id)?;
            }
            tx.commit()?;
            Ok(deleted)
        })?;

        if deleted {
            info!(plan_id = id, "Plan deleted (memberships retained)");
        }
        Ok(deleted)
    }
}

fn validate_duration(duration: DurationPolicy) -> TurnstileResult<()> {
    if let (_, Some(0)) = duration.as_parts() {
        return Err(TurnstileError::Validation {
            field: "duration",
            reason: "value must be at least 1".to_string(),
        });
    }
    Ok(())
}
