mod contact_notifier;
mod contact_service;

pub use contact_notifier::{ContactNotifier, ContactSubmission, LogContactNotifier, NotifierError};
pub use contact_service::ContactService;
