//! Keep-alive producer for long silent stretches of a job.

mod ticker;

pub use ticker::HeartbeatTicker;
