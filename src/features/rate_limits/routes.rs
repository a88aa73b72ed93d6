use std::sync::Arc;

use axum::{routing::get, Router};

use super::handlers::get_rate_limit_status;
use super::services::AdmissionController;

/// Create routes for rate limit introspection
pub fn routes(controller: Arc<AdmissionController>) -> Router {
    Router::new()
        .route("/api/rate-limit/{policy}", get(get_rate_limit_status))
        .with_state(controller)
}
