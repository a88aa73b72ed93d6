mod chat_dto;

pub use chat_dto::{ChatMessage, ChatRequestDto, ChatRole, StreamEvent};
