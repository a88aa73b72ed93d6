//! Contact requests submitted from the consultancy's website.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | POST | `/api/contact` | Submit a contact request |

pub mod dtos;
pub mod handlers;
pub mod routes;
pub mod services;

pub use services::{ContactNotifier, ContactService, LogContactNotifier};
