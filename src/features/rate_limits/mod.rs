//! In-memory admission control.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/rate-limit/{policy}` | Caller's standing within a policy (`chat` or `contact`) |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use models::{PolicyKind, RateLimitPolicy};
pub use services::{AdmissionController, RateLimitStore};
