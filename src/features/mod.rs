pub mod chat;
pub mod contact;
pub mod rate_limits;
