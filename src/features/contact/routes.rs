use axum::{routing::post, Router};

use super::handlers::{submit_contact, ContactState};

/// Create routes for contact submissions
pub fn routes(state: ContactState) -> Router {
    Router::new()
        .route("/api/contact", post(submit_contact))
        .with_state(state)
}
