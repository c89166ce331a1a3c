//! EngineConfig: feature toggles for the membership engine.
//!
//! Passed explicitly to the components that need it — there is no
//! process-wide settings singleton.

use serde::Deserialize;

/// Engine configuration, typically loaded from a `[turnstile]` section
/// of the host's TOML config. Every field has a default so a missing
/// section yields stock behavior.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Grant memberships when an order reaches the completed state.
    pub auto_grant_on_complete: bool,
    /// Revoke memberships when an order is refunded.
    pub revoke_on_refund: bool,
    /// Whether the expiration sweeper is allowed to run.
    pub expiration_check_enabled: bool,
    /// Reader connections in the storage pool.
    pub read_pool_size: usize,
    /// TTL in seconds for commerce-event dedup entries.
    pub dedup_ttl_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            auto_grant_on_complete: true,
            revoke_on_refund: true,
            expiration_check_enabled: true,
            read_pool_size: 2,
            dedup_ttl_secs: 60,
        }
    }
}

impl EngineConfig {
    /// Parse a TOML fragment into a config, filling unset fields with
    /// defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}
