//! Event snapshots handed over by the commerce host.
//!
//! The host resolves orders and subscriptions to these flat payloads
//! before calling the adapter — the adapter never talks to the commerce
//! platform directly.

use serde::{Deserialize, Serialize};
use turnstile_core::types::{OrderId, ProductId, SubscriptionId, UserId};

/// A settled order, reduced to what membership processing needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub order_id: OrderId,
    /// Buyer; None for guest checkouts, which grant nothing.
    pub user_id: Option<UserId>,
    /// Product ids across all line items.
    pub product_ids: Vec<ProductId>,
    /// Whether every line item is virtual. Orders still in the
    /// processing state are only granted when true.
    pub all_virtual: bool,
}

/// A subscription, reduced to what membership processing needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionSnapshot {
    pub subscription_id: SubscriptionId,
    pub user_id: Option<UserId>,
    pub product_ids: Vec<ProductId>,
}

/// Host-side subscription states the adapter reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubscriptionStatus {
    Active,
    OnHold,
    Cancelled,
    Expired,
    PendingCancel,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::OnHold => "on-hold",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
            Self::PendingCancel => "pending-cancel",
        }
    }
}
