//! Incremental decoder for OpenAI-style `text/event-stream` completion bodies.

use serde::Deserialize;

use super::ProviderError;

/// One meaningful item decoded from the upstream stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    Delta(String),
    Done,
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    error: Option<ChunkError>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkError {
    #[serde(default)]
    message: String,
}

/// Buffers raw bytes and yields frames line by line.
///
/// Bytes are kept undecoded until a full line is available, so a multi-byte
/// character split across network reads survives intact. Each `data:` line is
/// treated as a complete payload.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next network read and collect every frame it completes
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<SseFrame>, ProviderError> {
        self.buffer.extend_from_slice(bytes);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(frame) = parse_line(&line)? {
                frames.push(frame);
            }
        }

        Ok(frames)
    }

    /// Decode whatever is left once the body has ended without a trailing newline
    pub fn finish(&mut self) -> Result<Option<SseFrame>, ProviderError> {
        let rest = std::mem::take(&mut self.buffer);
        parse_line(&rest)
    }
}

fn parse_line(raw: &[u8]) -> Result<Option<SseFrame>, ProviderError> {
    let line = String::from_utf8_lossy(raw);

    // Comments, `event:`/`id:` fields and blank separators carry no content
    let Some(payload) = line.trim_end().strip_prefix("data:") else {
        return Ok(None);
    };

    let payload = payload.trim();
    if payload.is_empty() {
        return Ok(None);
    }
    if payload == "[DONE]" {
        return Ok(Some(SseFrame::Done));
    }

    let chunk: CompletionChunk =
        serde_json::from_str(payload).map_err(|e| ProviderError::Parse(e.to_string()))?;

    if let Some(error) = chunk.error {
        return Err(ProviderError::Stream(error.message));
    }

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty())
        .map(SseFrame::Delta))
}
