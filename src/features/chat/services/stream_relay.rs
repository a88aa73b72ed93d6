use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::features::chat::clients::TokenStream;
use crate::features::chat::dtos::StreamEvent;
use crate::shared::constants::GENERIC_STREAM_ERROR;

use super::contact_intent::{strip_contact_marker, ContactIntent};

/// How a relay run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Completed {
        chunks: usize,
        show_contact_button: bool,
    },
    Failed {
        chunks: usize,
    },
    /// The client went away before the terminal event could be delivered
    Cancelled {
        chunks: usize,
    },
}

/// Forwards provider deltas to the client as paced events.
///
/// Emits zero or more `Chunk` events followed by exactly one terminal event
/// (`Complete` or `Error`), unless the receiver is dropped first, in which case
/// upstream consumption stops and nothing further is sent.
#[derive(Debug, Clone, Copy)]
pub struct StreamRelay {
    pacing: Duration,
}

impl StreamRelay {
    /// A zero `pacing` disables the delay between chunks
    pub fn new(pacing: Duration) -> Self {
        Self { pacing }
    }

    pub async fn run(
        &self,
        mut deltas: TokenStream,
        user_message: &str,
        tx: mpsc::Sender<StreamEvent>,
    ) -> RelayOutcome {
        let mut full_response = String::new();
        let mut chunks = 0usize;

        loop {
            let next = tokio::select! {
                _ = tx.closed() => {
                    debug!("Client disconnected after {} chunks", chunks);
                    return RelayOutcome::Cancelled { chunks };
                }
                next = deltas.next() => next,
            };

            match next {
                Some(Ok(delta)) => {
                    if delta.is_empty() {
                        continue;
                    }

                    full_response.push_str(&delta);
                    let event = StreamEvent::Chunk { content: delta };
                    if tx.send(event).await.is_err() {
                        return RelayOutcome::Cancelled { chunks };
                    }
                    chunks += 1;

                    if !self.pacing.is_zero() {
                        tokio::select! {
                            _ = tx.closed() => return RelayOutcome::Cancelled { chunks },
                            _ = tokio::time::sleep(self.pacing) => {}
                        }
                    }
                }
                Some(Err(e)) => {
                    error!("Upstream stream failed after {} chunks: {}", chunks, e);
                    let event = StreamEvent::Error {
                        error: GENERIC_STREAM_ERROR.to_string(),
                    };
                    if tx.send(event).await.is_err() {
                        return RelayOutcome::Cancelled { chunks };
                    }
                    return RelayOutcome::Failed { chunks };
                }
                None => break,
            }
        }

        let intent = ContactIntent::classify(&full_response, user_message);
        let show_contact_button = intent.show_contact_button();
        debug!(
            explicit = intent.explicit,
            inferred = intent.inferred,
            "Stream completed with {} chunks",
            chunks
        );

        let event = StreamEvent::Complete {
            full_response: strip_contact_marker(&full_response),
            show_contact_button,
        };
        if tx.send(event).await.is_err() {
            return RelayOutcome::Cancelled { chunks };
        }

        RelayOutcome::Completed {
            chunks,
            show_contact_button,
        }
    }
}
