use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;

use async_trait::async_trait;
use futures::{stream, Stream, StreamExt};
use serde::{Deserialize, Serialize};

use super::sse_parser::{SseFrame, SseParser};
use super::{ChatCompletionProvider, CompletionParams, ProviderError, TokenStream};
use crate::core::config::LlmConfig;
use crate::features::chat::dtos::ChatMessage;

/// Longest slice of an upstream error body kept in a `ProviderError`
const MAX_ERROR_BODY_CHARS: usize = 300;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .user_agent("TalentoGateway/0.1")
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl ChatCompletionProvider for OpenAiClient {
    async fn create_streaming_completion(
        &self,
        messages: &[ChatMessage],
        params: CompletionParams,
    ) -> Result<TokenStream, ProviderError> {
        let body = CompletionRequest {
            model: &self.model,
            messages,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            stream: true,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status.as_u16(), &body));
        }

        tracing::debug!(
            "Streaming completion started: model={}, messages={}",
            self.model,
            messages.len()
        );

        Ok(delta_stream(response.bytes_stream()))
    }
}

/// Map a non-success HTTP status to the error taxonomy
fn classify_failure(status: u16, body: &str) -> ProviderError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.chars().take(MAX_ERROR_BODY_CHARS).collect());

    match status {
        429 => ProviderError::QuotaExceeded(message),
        401 | 403 => ProviderError::InvalidCredentials(message),
        _ => ProviderError::Api { status, message },
    }
}

struct DeltaState<S> {
    bytes: Pin<Box<S>>,
    parser: SseParser,
    pending: VecDeque<Result<String, ProviderError>>,
    finished: bool,
}

impl<S> DeltaState<S> {
    /// Queue decoded frames; returns true once `[DONE]` is seen
    fn enqueue(&mut self, frames: Vec<SseFrame>) -> bool {
        for frame in frames {
            match frame {
                SseFrame::Delta(text) => self.pending.push_back(Ok(text)),
                SseFrame::Done => return true,
            }
        }
        false
    }

    fn fail(&mut self, err: ProviderError) {
        self.pending.push_back(Err(err));
        self.finished = true;
    }
}

/// Turn a raw completion body into a stream of text deltas.
///
/// The stream ends at `[DONE]` or at the end of the body, and yields at most one
/// error, after which it ends.
pub(super) fn delta_stream<S, B, E>(bytes: S) -> TokenStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = DeltaState {
        bytes: Box::pin(bytes),
        parser: SseParser::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => match state.parser.feed(chunk.as_ref()) {
                    Ok(frames) => state.finished = state.enqueue(frames),
                    Err(e) => state.fail(e),
                },
                Some(Err(e)) => state.fail(ProviderError::Transport(e.to_string())),
                None => {
                    match state.parser.finish() {
                        Ok(Some(frame)) => {
                            state.enqueue(vec![frame]);
                        }
                        Ok(None) => {}
                        Err(e) => state.pending.push_back(Err(e)),
                    }
                    state.finished = true;
                }
            }
        }
    }))
}
