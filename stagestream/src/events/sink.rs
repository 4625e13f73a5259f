//! Event sink trait and implementations.

use crate::core::JobEvent;
use tracing::{debug, info, Level};
use uuid::Uuid;

/// Observability tap for job events.
///
/// The job coordinator mirrors every event it forwards into its sink. Sinks
/// must not block and must never fail the job; errors are logged and
/// suppressed.
pub trait EventSink: Send + Sync {
    /// Records an event for `job_id` without blocking.
    fn try_emit(&self, job_id: Uuid, event: &JobEvent);
}

/// A no-op event sink that discards all events.
///
/// Used as the default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn try_emit(&self, _job_id: Uuid, _event: &JobEvent) {}
}

/// An event sink that logs events using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    /// The log level to use.
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a new logging event sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }
}

impl EventSink for LoggingEventSink {
    fn try_emit(&self, job_id: Uuid, event: &JobEvent) {
        // Heartbeats are noise at info level.
        if self.level == Level::DEBUG || event.is_heartbeat() {
            debug!(job_id = %job_id, event_type = event.kind(), stage = ?event.stage(), "Job event");
        } else {
            info!(job_id = %job_id, event_type = event.kind(), stage = ?event.stage(), "Job event");
        }
    }
}

/// A collecting event sink for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: parking_lot::RwLock<Vec<(Uuid, JobEvent)>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<JobEvent> {
        self.events.read().iter().map(|(_, e)| e.clone()).collect()
    }

    /// Returns the events recorded for one job.
    #[must_use]
    pub fn events_for(&self, job_id: Uuid) -> Vec<JobEvent> {
        self.events
            .read()
            .iter()
            .filter(|(id, _)| *id == job_id)
            .map(|(_, e)| e.clone())
            .collect()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }
}

impl EventSink for CollectingEventSink {
    fn try_emit(&self, job_id: Uuid, event: &JobEvent) {
        self.events.write().push((job_id, event.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_sink() {
        NoOpEventSink.try_emit(Uuid::new_v4(), &JobEvent::Heartbeat);
    }

    #[test]
    fn test_logging_sink() {
        let sink = LoggingEventSink::default();
        sink.try_emit(Uuid::new_v4(), &JobEvent::started("visionary"));
        LoggingEventSink::debug().try_emit(Uuid::new_v4(), &JobEvent::Heartbeat);
    }

    #[test]
    fn test_collecting_sink_filters_by_job() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        let job_a = Uuid::new_v4();
        let job_b = Uuid::new_v4();
        sink.try_emit(job_a, &JobEvent::started("x"));
        sink.try_emit(job_b, &JobEvent::Heartbeat);
        sink.try_emit(job_a, &JobEvent::Done);

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.events_for(job_a), vec![JobEvent::started("x"), JobEvent::Done]);

        sink.clear();
        assert!(sink.is_empty());
    }
}
