use std::collections::hash_map::Entry;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::error::{AppError, Result};
use crate::features::rate_limits::dtos::{AdmissionDecision, RateLimitDenial, RateLimitStatusDto};
use crate::features::rate_limits::models::{
    PolicyKind, RateLimitPolicy, RateLimitRecord, RecordKey,
};
use crate::features::rate_limits::services::RateLimitStore;

/// Fixed-window admission control over the shared [`RateLimitStore`].
///
/// Windows are fixed, not sliding: a client can get up to `2 * max_requests`
/// admissions across a window boundary (the tail of one window plus the head
/// of the next). Counters are per process.
pub struct AdmissionController {
    store: Arc<RateLimitStore>,
    chat: RateLimitPolicy,
    contact: RateLimitPolicy,
}

impl AdmissionController {
    pub fn new(store: Arc<RateLimitStore>, chat: RateLimitPolicy, contact: RateLimitPolicy) -> Self {
        Self {
            store,
            chat,
            contact,
        }
    }

    /// Current time according to the store's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.store.now()
    }

    pub fn policy(&self, kind: PolicyKind) -> &RateLimitPolicy {
        match kind {
            PolicyKind::Chat => &self.chat,
            PolicyKind::Contact => &self.contact,
        }
    }

    /// Count one request from `identifier` against the policy and decide.
    ///
    /// Never fails; a rejection is reported through `admitted = false`.
    pub fn check(&self, kind: PolicyKind, identifier: &str) -> AdmissionDecision {
        let policy = *self.policy(kind);
        self.store
            .with_entry(RecordKey::new(kind, identifier), |entry, now| {
                fixed_window(&policy, entry, now)
            })
    }

    /// Like [`check`](Self::check), but turns a rejection into [`AppError::RateLimitExceeded`]
    pub fn admit(&self, kind: PolicyKind, identifier: &str) -> Result<AdmissionDecision> {
        let decision = self.check(kind, identifier);

        if decision.admitted {
            return Ok(decision);
        }

        let retry_after_secs = decision.retry_after_secs(self.store.now());
        tracing::warn!(
            "Rate limit exceeded: policy={}, identifier={}, retry_after={}s",
            kind,
            identifier,
            retry_after_secs
        );

        Err(AppError::RateLimitExceeded(RateLimitDenial {
            policy: kind,
            limit: decision.limit,
            reset_at: decision.reset_at,
            retry_after_secs,
        }))
    }

    /// Current standing of `identifier`, without counting a request
    pub fn status(&self, kind: PolicyKind, identifier: &str) -> RateLimitStatusDto {
        let policy = self.policy(kind);
        let now = self.store.now();
        let live = self
            .store
            .get(&RecordKey::new(kind, identifier))
            .filter(|record| record.is_live(now));

        match live {
            Some(record) => {
                let used = record.count.min(policy.max_requests);
                RateLimitStatusDto {
                    policy: kind,
                    limit: policy.max_requests,
                    used,
                    remaining: policy.max_requests - used,
                    resets_at: Some(record.window_reset_at),
                }
            }
            None => RateLimitStatusDto {
                policy: kind,
                limit: policy.max_requests,
                used: 0,
                remaining: policy.max_requests,
                resets_at: None,
            },
        }
    }
}

/// Fixed-window counter transition for one request.
///
/// The stored count keeps growing past the maximum while the window is open;
/// only the decision is capped.
fn fixed_window(
    policy: &RateLimitPolicy,
    entry: Entry<'_, RecordKey, RateLimitRecord>,
    now: DateTime<Utc>,
) -> AdmissionDecision {
    let limit = policy.max_requests;

    match entry {
        Entry::Occupied(mut occupied) if occupied.get().is_live(now) => {
            let record = occupied.get_mut();
            record.count = record.count.saturating_add(1);

            if record.count > limit {
                AdmissionDecision {
                    admitted: false,
                    limit,
                    remaining: 0,
                    reset_at: record.window_reset_at,
                }
            } else {
                AdmissionDecision {
                    admitted: true,
                    limit,
                    remaining: limit - record.count,
                    reset_at: record.window_reset_at,
                }
            }
        }
        entry => {
            let record = RateLimitRecord::open(now, policy.window);
            match entry {
                Entry::Occupied(mut occupied) => {
                    occupied.insert(record);
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(record);
                }
            }

            AdmissionDecision {
                admitted: true,
                limit,
                remaining: limit.saturating_sub(1),
                reset_at: record.window_reset_at,
            }
        }
    }
}
