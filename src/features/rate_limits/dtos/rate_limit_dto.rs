use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::features::rate_limits::models::PolicyKind;

/// Outcome of a single admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionDecision {
    pub admitted: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl AdmissionDecision {
    /// Whole seconds until `reset_at`, rounded up
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> u64 {
        let millis = (self.reset_at - now).num_milliseconds().max(0) as u64;
        millis.div_ceil(1000)
    }
}

/// Details carried by a rate-limit rejection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDenial {
    pub policy: PolicyKind,
    pub limit: u32,
    pub reset_at: DateTime<Utc>,
    pub retry_after_secs: u64,
}

/// Caller's current standing within a policy window
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStatusDto {
    /// Policy the status refers to
    pub policy: PolicyKind,
    /// Maximum requests admitted per window
    pub limit: u32,
    /// Requests admitted in the current window
    pub used: u32,
    /// Requests left before the window closes
    pub remaining: u32,
    /// When the current window closes (null when no window is open)
    pub resets_at: Option<DateTime<Utc>>,
}
