//! Upstream language-model provider seam.

mod openai_client;
mod sse_parser;

pub use openai_client::OpenAiClient;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use thiserror::Error;

use crate::features::chat::dtos::ChatMessage;

/// Lazy, finite, non-restartable sequence of text deltas
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send>>;

/// Failures reported by the upstream provider, either before or during streaming
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Provider quota exhausted: {0}")]
    QuotaExceeded(String),

    #[error("Provider rejected credentials: {0}")]
    InvalidCredentials(String),

    #[error("Provider returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Provider reported an error mid-stream: {0}")]
    Stream(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed stream payload: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Transport(err.to_string())
    }
}

/// Fixed sampling parameters sent with every completion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

#[async_trait]
pub trait ChatCompletionProvider: Send + Sync {
    /// Start a streaming completion.
    ///
    /// Errors returned here happen before any token was produced; errors inside
    /// the returned stream happen after streaming has begun.
    async fn create_streaming_completion(
        &self,
        messages: &[ChatMessage],
        params: CompletionParams,
    ) -> Result<TokenStream, ProviderError>;
}
