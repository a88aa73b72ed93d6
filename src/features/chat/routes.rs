use axum::{routing::post, Router};

use super::handlers::{chat_stream, ChatState};

/// Create routes for the chat stream
pub fn routes(state: ChatState) -> Router {
    Router::new()
        .route("/api/chat", post(chat_stream))
        .with_state(state)
}
