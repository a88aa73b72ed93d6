//! Streaming chat with the consultancy's assistant.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | POST | `/api/chat` | Send a message, receive the answer as server-sent events |

pub mod clients;
pub mod dtos;
pub mod handlers;
pub mod routes;
pub mod services;

pub use handlers::ChatState;
pub use services::ChatService;
