//! Event channel and observability sinks.
//!
//! The channel is the only path between the pipeline runner, the heartbeat
//! ticker and the job coordinator. Sinks are an optional tap the coordinator
//! mirrors forwarded events into for logging and tests.

mod channel;
mod sink;

pub use channel::{event_channel, EventReceiver, EventSender};
pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
