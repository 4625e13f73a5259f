//! Logging setup and span helpers.
//!
//! The crate only emits `tracing` events; installing a subscriber is left to
//! the embedding application, which can use [`init_logging`] for the common
//! case.

mod logging;
mod spans;

pub use logging::{init_logging, LogFormat};
pub use spans::{job_span, stage_span, SpanTimer};
