//! Span constructors and timing.

use std::time::Instant;
use tracing::Span;
use uuid::Uuid;

/// Span covering one job from the first stage to `Done`.
#[must_use]
pub fn job_span(job_id: Uuid, owner_id: Uuid, pipeline: &str) -> Span {
    tracing::info_span!(
        "job",
        job_id = %job_id,
        owner_id = %owner_id,
        pipeline = pipeline,
    )
}

/// Span covering one stage execution.
#[must_use]
pub fn stage_span(stage: &str, step: usize, total: usize) -> Span {
    tracing::info_span!("stage", stage = stage, step = step, total = total)
}

/// Simple span timing helper.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: String,
}

impl SpanTimer {
    /// Starts a new timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns the timer name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stops the timer and returns the duration in milliseconds.
    #[must_use]
    pub fn finish(self) -> f64 {
        self.elapsed_ms()
    }
}
