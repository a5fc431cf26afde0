use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{LifecycleError, Result};
use crate::salt::salt_to_unit;

/// Elapsed-time threshold below which a resource is still `pending`.
pub const PENDING_MS: i64 = 300;
/// Elapsed-time threshold below which a resource is `parsed`; at or beyond
/// it the resource is terminal.
pub const PARSED_MS: i64 = 1000;

/// Lifecycle state of an uploaded resource, re-derived on every query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    Pending,
    Parsed,
    Indexed,
    Error,
}

impl LifecycleStatus {
    /// `indexed` and `error` never change once reached.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Indexed | Self::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Parsed => "parsed",
            Self::Indexed => "indexed",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deterministically derive a status from elapsed time and failure rate.
///
/// Timeline (elapsed = `now_ms - created_at_ms`, clamped at zero so clock
/// skew can never run the pipeline backwards):
///
/// ```text
/// 0..300 ms     -> pending
/// 300..1000 ms  -> parsed
/// >= 1000 ms    -> indexed or error, split by the salt-drawn uniform
/// ```
///
/// The terminal outcome depends only on `salt` and `failure_rate`, so
/// re-querying the same token later always yields the same terminal state.
pub fn compute_status(
    created_at_ms: i64,
    now_ms: i64,
    salt: u64,
    failure_rate: f64,
) -> Result<LifecycleStatus> {
    if !(0.0..=1.0).contains(&failure_rate) {
        return Err(LifecycleError::InvalidFailureRate(failure_rate));
    }

    let elapsed = (now_ms.saturating_sub(created_at_ms)).max(0);
    if elapsed < PENDING_MS {
        return Ok(LifecycleStatus::Pending);
    }
    if elapsed < PARSED_MS {
        return Ok(LifecycleStatus::Parsed);
    }

    let u = salt_to_unit(salt);
    Ok(if u < failure_rate {
        LifecycleStatus::Error
    } else {
        LifecycleStatus::Indexed
    })
}
