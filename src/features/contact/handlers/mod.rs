pub mod contact_handler;

pub use contact_handler::{submit_contact, ContactState};
