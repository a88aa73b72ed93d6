//! Fixtures shared by unit and handler tests.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use axum::{body::Body, response::Response};
use chrono::{DateTime, Duration, TimeZone, Utc};
use futures::stream;

use crate::features::chat::clients::{
    ChatCompletionProvider, CompletionParams, ProviderError, TokenStream,
};
use crate::features::chat::dtos::ChatMessage;
use crate::shared::clock::Clock;

/// Clock that only moves when told to
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        let start = Utc
            .with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
            .single()
            .expect("valid start instant");
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub async fn json_body(response: Response) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).expect("json body")
}

/// Decode every `data:` frame of an event-stream body, skipping comments
pub async fn sse_events(response: Response) -> Vec<serde_json::Value> {
    body_text(response)
        .await
        .split("\n\n")
        .filter_map(|frame| frame.lines().find_map(|line| line.strip_prefix("data: ")))
        .map(|data| serde_json::from_str(data).expect("json frame"))
        .collect()
}

pub fn json_request(uri: &str, ip: &str, body: serde_json::Value) -> axum::http::Request<Body> {
    axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-forwarded-for", ip)
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

/// Provider that replays a fixed script and records what it was asked
pub struct ScriptedProvider {
    script: Vec<Result<String, ProviderError>>,
    failure: Option<ProviderError>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            script,
            failure: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_deltas(deltas: &[&str]) -> Self {
        Self::new(deltas.iter().map(|d| Ok(d.to_string())).collect())
    }

    /// Fails before any token is produced
    pub fn failing(error: ProviderError) -> Self {
        Self {
            failure: Some(error),
            ..Self::new(Vec::new())
        }
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn calls(&self) -> usize {
        self.requests().len()
    }
}

#[async_trait]
impl ChatCompletionProvider for ScriptedProvider {
    async fn create_streaming_completion(
        &self,
        messages: &[ChatMessage],
        _params: CompletionParams,
    ) -> Result<TokenStream, ProviderError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(messages.to_vec());

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        Ok(Box::pin(stream::iter(self.script.clone())))
    }
}
