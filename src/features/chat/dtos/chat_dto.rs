use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::shared::constants::{MAX_ASSISTANT_TURN_CHARS, MAX_CHAT_MESSAGE_CHARS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One turn of a conversation, as exchanged with the client and the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    #[allow(dead_code)]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Request DTO for sending a chat message
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequestDto {
    /// The visitor's message (1-300 characters)
    #[validate(
        required(message = "El mensaje es obligatorio"),
        length(
            min = 1,
            max = 300,
            message = "El mensaje debe tener entre 1 y 300 caracteres"
        )
    )]
    pub message: Option<String>,

    /// Previous `user`/`assistant` turns. Only the 10 most recent are used.
    #[serde(default)]
    #[validate(custom(function = "validate_history"))]
    pub conversation_history: Vec<ChatMessage>,
}

/// Client history may only replay visitor and assistant turns within their length bounds.
///
/// The leading system message is owned by the server; a `system` turn here is rejected.
fn validate_history(history: &[ChatMessage]) -> Result<(), ValidationError> {
    for (index, turn) in history.iter().enumerate() {
        let chars = turn.content.chars().count();
        let message = match turn.role {
            ChatRole::System => Some(format!(
                "El historial no puede incluir mensajes de sistema (posición {})",
                index
            )),
            ChatRole::User if chars > MAX_CHAT_MESSAGE_CHARS => Some(format!(
                "Los mensajes del historial no pueden superar {} caracteres (posición {})",
                MAX_CHAT_MESSAGE_CHARS, index
            )),
            ChatRole::Assistant if chars > MAX_ASSISTANT_TURN_CHARS => Some(format!(
                "Las respuestas del historial no pueden superar {} caracteres (posición {})",
                MAX_ASSISTANT_TURN_CHARS, index
            )),
            _ => None,
        };

        if let Some(message) = message {
            return Err(
                ValidationError::new("conversation_history").with_message(Cow::Owned(message))
            );
        }
    }

    Ok(())
}

/// One frame of the chat response stream.
///
/// Any number of `chunk` frames is followed by exactly one `complete` or `error` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    /// A piece of the answer, in arrival order
    Chunk { content: String },

    /// The full answer with internal markers removed
    Complete {
        #[serde(rename = "fullResponse")]
        full_response: String,
        #[serde(rename = "showContactButton")]
        show_contact_button: bool,
    },

    /// Generation failed after the stream was opened
    Error { error: String },
}
