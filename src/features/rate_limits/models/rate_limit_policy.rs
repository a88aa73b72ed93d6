use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::constants::{CHAT_POLICY, CONTACT_POLICY};

/// The admission policies the gateway enforces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    Chat,
    Contact,
}

impl PolicyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::Chat => CHAT_POLICY,
            PolicyKind::Contact => CONTACT_POLICY,
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            CHAT_POLICY => Ok(PolicyKind::Chat),
            CONTACT_POLICY => Ok(PolicyKind::Contact),
            other => Err(format!("Política de límite desconocida '{}'", other)),
        }
    }
}

/// Fixed-window policy: at most `max_requests` admissions per `window`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub kind: PolicyKind,
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitPolicy {
    /// Windows too long for chrono saturate at [`Duration::MAX`]
    pub fn new(kind: PolicyKind, max_requests: u32, window_secs: u64) -> Self {
        let window = i64::try_from(window_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);

        Self {
            kind,
            max_requests,
            window,
        }
    }
}

/// Counter for one identifier within one policy window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRecord {
    pub count: u32,
    pub window_reset_at: DateTime<Utc>,
}

impl RateLimitRecord {
    /// Opens a window at `now` with the first request already counted.
    ///
    /// A reset beyond the representable range is clamped to the latest instant.
    pub fn open(now: DateTime<Utc>, window: Duration) -> Self {
        Self {
            count: 1,
            window_reset_at: now
                .checked_add_signed(window)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// A record stays live until the clock reaches `window_reset_at`
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.window_reset_at
    }
}

/// Store key; each policy has its own identifier namespace
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub policy: PolicyKind,
    pub identifier: String,
}

impl RecordKey {
    pub fn new(policy: PolicyKind, identifier: impl Into<String>) -> Self {
        Self {
            policy,
            identifier: identifier.into(),
        }
    }
}
