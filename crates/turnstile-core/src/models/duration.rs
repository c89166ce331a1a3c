//! Duration policy and expiration arithmetic.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ParseEnumError;

/// How long a plan's membership lasts from its start date.
///
/// The "value present iff not forever" invariant is encoded in the
/// variants: `Forever` carries no value, every bounded variant does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum DurationPolicy {
    Forever,
    Days(u32),
    Months(u32),
    Years(u32),
}

impl DurationPolicy {
    /// Compute the expiration instant for a membership starting at
    /// `start`. Returns `None` for unbounded plans.
    ///
    /// Month and year addition clamps to the last day of the target
    /// month (Jan 31 + 1 month = Feb 28/29), the `chrono::Months`
    /// convention. Pure and deterministic for a fixed input.
    pub fn expiration_from(&self, start: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match *self {
            Self::Forever => None,
            Self::Days(n) => Some(start + Duration::days(i64::from(n))),
            Self::Months(n) => start.checked_add_months(Months::new(n)),
            Self::Years(n) => start.checked_add_months(Months::new(n.saturating_mul(12))),
        }
    }

    /// Whether this policy never expires.
    pub fn is_unbounded(&self) -> bool {
        matches!(self, Self::Forever)
    }

    /// Split into the `(kind, value)` pair used by the storage layer.
    pub fn as_parts(&self) -> (&'static str, Option<u32>) {
        match *self {
            Self::Forever => ("forever", None),
            Self::Days(n) => ("days", Some(n)),
            Self::Months(n) => ("months", Some(n)),
            Self::Years(n) => ("years", Some(n)),
        }
    }

    /// Rebuild from the stored `(kind, value)` pair.
    ///
    /// A bounded kind with a missing value is treated as malformed. A
    /// `forever` kind ignores any stray value.
    pub fn from_parts(kind: &str, value: Option<u32>) -> Result<Self, ParseEnumError> {
        let malformed = || ParseEnumError {
            kind: "duration_value",
            value: "<missing>".to_string(),
        };
        match kind {
            "forever" => Ok(Self::Forever),
            "days" => value.map(Self::Days).ok_or_else(malformed),
            "months" => value.map(Self::Months).ok_or_else(malformed),
            "years" => value.map(Self::Years).ok_or_else(malformed),
            other => Err(ParseEnumError {
                kind: "duration_type",
                value: other.to_string(),
            }),
        }
    }
}
