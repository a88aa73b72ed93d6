use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, Instrument, Span};

use crate::core::error::Result;
use crate::core::extractor::ClientIdentifier;
use crate::features::chat::clients::{ChatCompletionProvider, CompletionParams};
use crate::features::chat::dtos::{ChatMessage, StreamEvent};
use crate::features::rate_limits::{AdmissionController, PolicyKind};
use crate::shared::constants::{MAX_HISTORY_MESSAGES, STREAM_EVENT_BUFFER};

use super::stream_relay::StreamRelay;

/// Handles one chat turn: admission, context assembly, and the upstream call.
///
/// Everything that can fail before the first byte of the response is reported
/// as an `AppError`; anything after that travels inside the event stream.
pub struct ChatService {
    provider: Arc<dyn ChatCompletionProvider>,
    admission: Arc<AdmissionController>,
    relay: StreamRelay,
    params: CompletionParams,
    system_prompt: String,
}

impl ChatService {
    pub fn new(
        provider: Arc<dyn ChatCompletionProvider>,
        admission: Arc<AdmissionController>,
        relay: StreamRelay,
        params: CompletionParams,
        system_prompt: String,
    ) -> Self {
        Self {
            provider,
            admission,
            relay,
            params,
            system_prompt,
        }
    }

    /// Admit the caller, open the upstream stream, and hand back the event receiver.
    ///
    /// The relay runs on its own task and stops as soon as the receiver is dropped.
    pub async fn start_stream(
        &self,
        client: &ClientIdentifier,
        message: String,
        history: Vec<ChatMessage>,
    ) -> Result<mpsc::Receiver<StreamEvent>> {
        let decision = self.admission.admit(PolicyKind::Chat, client.as_str())?;

        let context = assemble_context(&self.system_prompt, &history, &message);
        info!(
            remaining = decision.remaining,
            history = history.len(),
            forwarded = context.len(),
            "Starting chat stream"
        );

        let deltas = self
            .provider
            .create_streaming_completion(&context, self.params)
            .await?;

        let (tx, rx) = mpsc::channel(STREAM_EVENT_BUFFER);
        let relay = self.relay;
        tokio::spawn(
            async move {
                let outcome = relay.run(deltas, &message, tx).await;
                info!(?outcome, "Chat stream finished");
            }
            .instrument(Span::current()),
        );

        Ok(rx)
    }
}

/// Build the upstream message list: the system prompt, the most recent history
/// entries in their original order, then the new user message.
pub fn assemble_context(
    system_prompt: &str,
    history: &[ChatMessage],
    message: &str,
) -> Vec<ChatMessage> {
    let recent = &history[history.len().saturating_sub(MAX_HISTORY_MESSAGES)..];

    let mut context = Vec::with_capacity(recent.len() + 2);
    context.push(ChatMessage::system(system_prompt));
    context.extend(recent.iter().cloned());
    context.push(ChatMessage::user(message));
    context
}
