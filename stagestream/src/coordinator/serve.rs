//! The job coordinator.

use super::guard::DisconnectGuard;
use crate::cancellation::StopSignal;
use crate::config::OrchestratorConfig;
use crate::core::JobEvent;
use crate::encoding::encode_stream;
use crate::events::{event_channel, EventSink, NoOpEventSink};
use crate::heartbeat::HeartbeatTicker;
use crate::pipeline::{Job, PipelineRunner};
use futures::stream::Stream;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Serves jobs as event streams.
///
/// Cheap to clone; one coordinator is shared by every request.
#[derive(Clone)]
pub struct JobCoordinator {
    runner: Arc<PipelineRunner>,
    sink: Arc<dyn EventSink>,
}

impl JobCoordinator {
    /// Creates a coordinator around a shared runner.
    #[must_use]
    pub fn new(runner: Arc<PipelineRunner>) -> Self {
        Self {
            runner,
            sink: Arc::new(NoOpEventSink),
        }
    }

    /// Mirrors every forwarded event into `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Returns the runner's configuration.
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        self.runner.config()
    }

    /// Starts `job` and returns its events.
    ///
    /// Nothing runs until the stream is first polled. The stream ends right
    /// after `Done`. If the runner task dies without sending `Done`, an
    /// `Error` (unless a terminal event was already seen) and `Done` are
    /// synthesized. Dropping the stream early stops the heartbeat and applies
    /// the configured [`DisconnectPolicy`](crate::config::DisconnectPolicy);
    /// under `Abandon` the stage already executing runs to completion in its
    /// own task but no later stage starts and nothing is persisted.
    pub fn serve(&self, job: Job) -> impl Stream<Item = JobEvent> + Send + 'static {
        let runner = Arc::clone(&self.runner);
        let sink = Arc::clone(&self.sink);
        let interval = runner.config().heartbeat_interval();
        let policy = runner.config().disconnect_policy;

        async_stream::stream! {
            let job_id = job.id;
            let (tx, mut rx) = event_channel();
            let stop = StopSignal::new();
            let cancel = StopSignal::new();

            // Only the runner and the ticker hold senders from here on.
            let _heartbeat = HeartbeatTicker::new(interval).start(tx.clone(), stop.clone());
            let mut runner_task = {
                let stop = stop.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move { runner.run_with_cancel(&job, &tx, &stop, &cancel).await })
            };
            let mut guard = DisconnectGuard::new(job_id, stop.clone(), cancel, policy);

            let mut runner_joined = false;
            let mut terminal_seen = false;

            loop {
                let next = tokio::select! {
                    biased;
                    event = rx.get() => event,
                    joined = &mut runner_task, if !runner_joined => {
                        runner_joined = true;
                        match joined {
                            Ok(outcome) => debug!(job_id = %job_id, completed = outcome.is_completed(), "runner finished"),
                            Err(err) => {
                                error!(job_id = %job_id, error = %err, "runner task died");
                                stop.stop("runner task died");
                            }
                        }
                        continue;
                    }
                };

                match next {
                    Some(event) => {
                        sink.try_emit(job_id, &event);
                        terminal_seen |= event.is_terminal_result();
                        let done = event.is_done();
                        yield event;
                        if done {
                            break;
                        }
                    }
                    None => {
                        warn!(job_id = %job_id, "event channel closed without completion");
                        if !terminal_seen {
                            let event = JobEvent::error("The job ended unexpectedly.");
                            sink.try_emit(job_id, &event);
                            yield event;
                        }
                        sink.try_emit(job_id, &JobEvent::Done);
                        yield JobEvent::Done;
                        break;
                    }
                }
            }

            guard.disarm();
            stop.stop("stream finished");
            rx.close();
        }
    }

    /// Starts `job` and returns its events as SSE frames.
    pub fn serve_encoded(&self, job: Job) -> impl Stream<Item = String> + Send + 'static {
        encode_stream(self.serve(job))
    }
}

impl std::fmt::Debug for JobCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobCoordinator")
            .field("runner", &self.runner)
            .finish_non_exhaustive()
    }
}
