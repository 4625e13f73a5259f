//! Cooperative stop signalling.
//!
//! This module provides the [`StopSignal`] shared between the job
//! coordinator and the two background activities of a job.

mod signal;

pub use signal::StopSignal;
