mod rate_limit_policy;

pub use rate_limit_policy::{PolicyKind, RateLimitPolicy, RateLimitRecord, RecordKey};
