//! Wire encodings for job events.

mod sse;

pub use sse::{encode_stream, StreamEncoder, HEARTBEAT_FRAME, RESPONSE_HEADERS};
