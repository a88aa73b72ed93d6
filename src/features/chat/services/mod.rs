mod chat_service;
mod contact_intent;
mod stream_relay;

pub use chat_service::{assemble_context, ChatService};
pub use contact_intent::{strip_contact_marker, ContactIntent};
pub use stream_relay::{RelayOutcome, StreamRelay};
