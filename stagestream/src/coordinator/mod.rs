//! Per-request job coordination.
//!
//! The coordinator wires a heartbeat ticker and a pipeline runner to one
//! event channel and exposes the channel as a lazy stream.

mod guard;
mod serve;

pub use serve::JobCoordinator;
