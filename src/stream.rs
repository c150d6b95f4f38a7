// Server-Sent Events Framing Module
// Shared SSE helpers for both provider stream formats.

use futures::Stream;
use serde::Serialize;
use std::pin::Pin;

/// Literal terminator sent after the last frame of every stream
pub const DONE_MARKER: &str = "data: [DONE]\n\n";

/// Content type of every streaming response
pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

/// A stream of fully formatted SSE events
pub type SseStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Format a frame as a Server-Sent Event
pub fn format_sse<T: Serialize>(frame: &T) -> String {
    let json = serde_json::to_string(frame).unwrap_or_else(|e| {
        tracing::error!("Failed to serialize stream frame: {}", e);
        "{}".to_string()
    });
    format!("data: {}\n\n", json)
}

/// Extract the JSON payloads from a concatenated SSE body, stopping at the
/// done marker. Returns the payloads and whether the marker was seen.
/// Payloads that are not JSON come back as string values.
///
/// Client-side decoding helper used by the test suites.
#[doc(hidden)]
pub fn parse_sse_payloads(body: &str) -> (Vec<serde_json::Value>, bool) {
    let mut payloads = Vec::new();
    for event in body.split("\n\n") {
        let Some(data) = event.strip_prefix("data: ") else {
            continue;
        };
        if data == "[DONE]" {
            return (payloads, true);
        }
        let value = serde_json::from_str(data)
            .unwrap_or_else(|_| serde_json::Value::String(data.to_string()));
        payloads.push(value);
    }
    (payloads, false)
}
