//! Server-sent event decoding for `streamGenerateContent?alt=sse`.
//!
//! The body arrives as arbitrary byte chunks. Lines are reassembled at the
//! byte level, so a chunk boundary inside a multi-byte character or inside a
//! JSON payload never loses data.

use super::protocol::{GenerateContentResponse, SAFETY_REFUSAL};
use futures::{Stream, StreamExt};
use sidechat_application::{ChatError, ChunkSink};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

const DATA_PREFIX: &str = "data: ";

/// Splits a byte stream into complete lines.
#[derive(Debug, Default)]
pub struct SseLineDecoder {
    buffer: Vec<u8>,
}

impl SseLineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes and drain every complete line.
    ///
    /// The trailing incomplete line stays buffered for the next call.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            lines.push(decode_line(&line[..pos]));
        }
        lines
    }

    /// Flush whatever is left once the body ends.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        Some(decode_line(&rest))
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Payload of a `data: ` line, without the prefix.
///
/// Comments, `event:` lines, blank separators and `data:` without the
/// space yield `None`.
pub fn payload(line: &str) -> Option<&str> {
    line.strip_prefix(DATA_PREFIX)
}

/// Running state of one streamed reply.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    text: String,
    safety_blocked: bool,
}

impl StreamAccumulator {
    /// Process one decoded line.
    ///
    /// Returns the text increment it carried, if any. Unparseable payloads
    /// are skipped; an in-band error object ends the stream.
    pub fn push_line(&mut self, line: &str) -> Result<Option<String>, ChatError> {
        let Some(data) = payload(line) else {
            return Ok(None);
        };
        let data = data.trim();
        if data.is_empty() || data == "[DONE]" {
            return Ok(None);
        }

        let response: GenerateContentResponse = match serde_json::from_str(data) {
            Ok(response) => response,
            Err(e) => {
                debug!("Skipping malformed stream payload: {}", e);
                return Ok(None);
            }
        };

        if let Some(error) = response.error.as_ref() {
            return Err(match error.message.as_deref() {
                Some(message) if !message.is_empty() => ChatError::Provider(message.to_string()),
                _ => ChatError::UnknownError,
            });
        }

        if response.is_safety_blocked() {
            self.safety_blocked = true;
        }

        match response.first_text() {
            Some(text) if !text.is_empty() => {
                self.text.push_str(text);
                Ok(Some(text.to_string()))
            }
            _ => Ok(None),
        }
    }

    pub fn full_text(&self) -> &str {
        &self.text
    }

    /// Whether the stream produced no text and was stopped by the safety
    /// filter.
    pub fn is_refusal(&self) -> bool {
        self.safety_blocked && self.text.is_empty()
    }

    pub fn finish(self) -> String {
        if self.is_refusal() {
            SAFETY_REFUSAL.to_string()
        } else {
            self.text
        }
    }
}

fn deliver(on_chunk: &mut Option<ChunkSink<'_>>, text: &str) {
    if let Some(sink) = on_chunk.as_deref_mut() {
        sink(text);
    }
}

/// Drive an SSE body to completion.
///
/// Every non-empty increment goes to `on_chunk` in arrival order; the
/// concatenation of the increments equals the returned text.
pub async fn read_event_stream<S, B>(
    mut stream: S,
    mut on_chunk: Option<ChunkSink<'_>>,
    cancellation: CancellationToken,
) -> Result<String, ChatError>
where
    S: Stream<Item = Result<B, ChatError>> + Unpin,
    B: AsRef<[u8]>,
{
    let mut decoder = SseLineDecoder::new();
    let mut accumulator = StreamAccumulator::default();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancellation.cancelled() => {
                debug!("Stream cancelled after {} bytes", accumulator.full_text().len());
                return Err(ChatError::Cancelled);
            }
            next = stream.next() => next,
        };

        let Some(chunk) = next else {
            break;
        };
        let chunk = chunk?;
        trace!("Received {} bytes", chunk.as_ref().len());

        for line in decoder.feed(chunk.as_ref()) {
            if let Some(increment) = accumulator.push_line(&line)? {
                deliver(&mut on_chunk, &increment);
            }
        }
    }

    if let Some(line) = decoder.finish()
        && let Some(increment) = accumulator.push_line(&line)?
    {
        deliver(&mut on_chunk, &increment);
    }

    if accumulator.is_refusal() {
        debug!("Stream blocked by safety filter");
        deliver(&mut on_chunk, SAFETY_REFUSAL);
    }

    Ok(accumulator.finish())
}
