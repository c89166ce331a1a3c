//! # turnstile-core
//!
//! Foundation crate for the Turnstile membership engine.
//! Defines the domain models (plans, memberships, content rules, product
//! links), duration arithmetic, slug derivation, the notification hub,
//! and engine configuration. Storage and services live in
//! `turnstile-engine`.

pub mod config;
pub mod events;
pub mod models;
pub mod slug;
pub mod types;

// Re-export the most commonly used types at the crate root.
pub use config::EngineConfig;
pub use events::{MembershipEvent, MembershipObserver, NotificationHub};
pub use models::content_rule::ContentRule;
pub use models::duration::DurationPolicy;
pub use models::membership::{Membership, MembershipSource, MembershipStatus};
pub use models::plan::{Plan, PlanStatus};
pub use models::product_link::ProductLink;
pub use types::{
    ContentId, MembershipId, OrderId, ParseEnumError, PlanId, ProductId, RestrictionReason,
    SubscriptionId, UserId,
};
