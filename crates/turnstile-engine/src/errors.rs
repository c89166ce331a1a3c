//! Engine error types.

use thiserror::Error;
use turnstile_core::types::{MembershipId, ParseEnumError, PlanId};

#[derive(Error, Debug)]
pub enum TurnstileError {
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("Duplicate plan slug: {slug}")]
    DuplicateSlug { slug: String },

    #[error("Plan not found: {plan_id}")]
    PlanNotFound { plan_id: PlanId },

    #[error("Membership not found: {membership_id}")]
    MembershipNotFound { membership_id: MembershipId },

    #[error("Plan {plan_id} is inactive and cannot be granted")]
    InactivePlan { plan_id: PlanId },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Malformed stored value: {0}")]
    MalformedRow(#[from] ParseEnumError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TurnstileError {
    /// Whether this is a not-found rejection batch callers may skip
    /// past rather than abort on.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::PlanNotFound { .. } | Self::MembershipNotFound { .. }
        )
    }
}

pub type TurnstileResult<T> = Result<T, TurnstileError>;
