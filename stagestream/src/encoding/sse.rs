//! Server-Sent Events framing.
//!
//! Data events become `data: <json>\n\n`. Heartbeats become the comment line
//! `: heartbeat\n\n`, which clients ignore but proxies count as traffic.

use crate::core::JobEvent;
use futures::stream::{Stream, StreamExt};
use tracing::error;

/// The keep-alive frame.
pub const HEARTBEAT_FRAME: &str = ": heartbeat\n\n";

/// Headers a transport should send with an event stream response.
pub const RESPONSE_HEADERS: [(&str, &str); 4] = [
    ("Content-Type", "text/event-stream"),
    ("Cache-Control", "no-cache"),
    ("Connection", "keep-alive"),
    ("X-Accel-Buffering", "no"),
];

/// Encodes job events as SSE frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamEncoder;

impl StreamEncoder {
    /// Encodes one event.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if the event cannot be rendered as JSON.
    pub fn encode(event: &JobEvent) -> Result<String, serde_json::Error> {
        if event.is_heartbeat() {
            return Ok(HEARTBEAT_FRAME.to_string());
        }
        let json = serde_json::to_string(event)?;
        Ok(format!("data: {json}\n\n"))
    }
}

/// Maps an event stream to a frame stream.
///
/// Events that fail to serialize are logged and skipped; the stream itself
/// never errors.
pub fn encode_stream<S>(events: S) -> impl Stream<Item = String> + Send
where
    S: Stream<Item = JobEvent> + Send,
{
    events.filter_map(|event| async move {
        match StreamEncoder::encode(&event) {
            Ok(frame) => Some(frame),
            Err(err) => {
                error!(error = %err, kind = event.kind(), "failed to encode event");
                None
            }
        }
    })
}
