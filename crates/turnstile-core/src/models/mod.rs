//! Domain models: plans, memberships, content rules, product links.

pub mod content_rule;
pub mod duration;
pub mod membership;
pub mod plan;
pub mod product_link;

pub use content_rule::ContentRule;
pub use duration::DurationPolicy;
pub use membership::{Membership, MembershipSource, MembershipStatus};
pub use plan::{Plan, PlanStatus};
pub use product_link::ProductLink;
