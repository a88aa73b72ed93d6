mod admission_controller;
mod rate_limit_store;

pub use admission_controller::AdmissionController;
pub use rate_limit_store::RateLimitStore;
