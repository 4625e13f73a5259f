//! Pipeline runner.
//!
//! Runs a job's stages in dependency order, reports lifecycle events on the
//! job's event channel, persists the final report once, and always finishes
//! with `Done`.

use super::context::{build_history_context, stage_input, StageOutputs};
use super::{HistorySource, Job};
use crate::cancellation::StopSignal;
use crate::config::OrchestratorConfig;
use crate::core::{JobEvent, JobOutcome, JobState, StageResult};
use crate::errors::{StageFailure, StagestreamError};
use crate::events::EventSender;
use crate::observability::{job_span, stage_span, SpanTimer};
use crate::stages::{StageExecutor, StageInput};
use crate::store::{ArtifactStore, HistoryStore};
use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn, Instrument};

/// Executes jobs against a shared executor and storage layer.
///
/// One runner is built at process start and shared across jobs; all per-job
/// state lives inside [`PipelineRunner::run`].
#[derive(Clone)]
pub struct PipelineRunner {
    executor: Arc<dyn StageExecutor>,
    artifacts: Arc<dyn ArtifactStore>,
    history: Arc<dyn HistoryStore>,
    config: OrchestratorConfig,
}

impl PipelineRunner {
    /// Creates a runner with the default configuration.
    #[must_use]
    pub fn new(
        executor: Arc<dyn StageExecutor>,
        artifacts: Arc<dyn ArtifactStore>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            executor,
            artifacts,
            history,
            config: OrchestratorConfig::default(),
        }
    }

    /// Replaces the configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` fails
    /// [`OrchestratorConfig::validate`].
    pub fn with_config(mut self, config: OrchestratorConfig) -> Result<Self, StagestreamError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Runs `job` to completion.
    ///
    /// Never fails: stage, history and persistence problems are reported as
    /// events and reflected in the returned outcome. `Done` is always the
    /// last event, enqueued while `stop` is set so no heartbeat follows it.
    pub async fn run(&self, job: &Job, events: &EventSender, stop: &StopSignal) -> JobOutcome {
        self.run_with_cancel(job, events, stop, &StopSignal::new()).await
    }

    /// Runs `job` until it finishes or `cancel` is set.
    ///
    /// Once `cancel` is set no further stage starts and nothing is persisted.
    /// Stages already executing keep running in their own tasks and their
    /// results are dropped.
    pub async fn run_with_cancel(
        &self,
        job: &Job,
        events: &EventSender,
        stop: &StopSignal,
        cancel: &StopSignal,
    ) -> JobOutcome {
        let span = job_span(job.id, job.owner_id, job.pipeline.name());
        async {
            let timer = SpanTimer::start("job");
            let mut state = JobState::Idle;

            let history = self.resolve_history(job).await;
            let stages = self
                .run_stages(job, history.as_deref(), events, cancel, &mut state)
                .await
                .and_then(|report| {
                    if cancel.is_stopped() {
                        Err(JobOutcome::Abandoned {
                            completed_stages: job.pipeline.stage_count(),
                        })
                    } else {
                        Ok(report)
                    }
                });
            let outcome = match stages {
                Ok(report) => self.persist(job, report, events, &mut state).await,
                Err(outcome) => {
                    if let JobOutcome::Abandoned { completed_stages } = &outcome {
                        info!(
                            completed_stages = *completed_stages,
                            reason = ?cancel.reason(),
                            "job abandoned, nothing persisted"
                        );
                    }
                    advance(&mut state, JobState::Failed);
                    outcome
                }
            };

            stop.stop_then("job finished", || events.put(JobEvent::Done));
            advance(&mut state, JobState::Closed);

            info!(
                completed = outcome.is_completed(),
                duration_ms = timer.finish(),
                "job finished"
            );
            outcome
        }
        .instrument(span)
        .await
    }

    async fn resolve_history(&self, job: &Job) -> Option<String> {
        match &job.history {
            HistorySource::None => None,
            HistorySource::Provided(text) if text.trim().is_empty() => None,
            HistorySource::Provided(text) => Some(text.clone()),
            HistorySource::Fetch => {
                match self
                    .history
                    .list_recent(job.owner_id, self.config.history_limit)
                    .await
                {
                    Ok(entries) => {
                        debug!(entries = entries.len(), "history fetched");
                        build_history_context(&entries, self.config.history_prefix_chars)
                    }
                    Err(err) => {
                        warn!(error = %err, "history fetch failed, continuing without history");
                        None
                    }
                }
            }
        }
    }

    /// Runs every stage, wave by wave. Returns the final stage's output, the
    /// first failure after its `Error` event has been enqueued, or
    /// `Abandoned` once `cancel` is set.
    async fn run_stages(
        &self,
        job: &Job,
        history: Option<&str>,
        events: &EventSender,
        cancel: &StopSignal,
        state: &mut JobState,
    ) -> Result<String, JobOutcome> {
        let pipeline = &job.pipeline;
        let stages = pipeline.stages();
        let total = stages.len();
        let limit = self.config.max_concurrent_stages.max(1);

        let mut outputs = StageOutputs::new();
        let mut started = 0usize;

        for wave in pipeline.waves() {
            let mut pending = wave.iter().copied();
            let mut in_flight = FuturesUnordered::new();
            let mut failure: Option<(String, StageFailure)> = None;

            loop {
                while failure.is_none() && in_flight.len() < limit && !cancel.is_stopped() {
                    let Some(index) = pending.next() else {
                        break;
                    };
                    let definition = &stages[index];
                    let input = stage_input(
                        definition,
                        &job.prompt,
                        &outputs,
                        if index == 0 { history } else { None },
                        index + 1,
                        total,
                    );

                    advance(state, JobState::Running { stage: started });
                    started += 1;
                    events.put(JobEvent::started(&definition.name));
                    info!(stage = %definition.name, step = index + 1, total, "stage started");
                    in_flight.push(self.execute_stage(input));
                }

                let next = tokio::select! {
                    biased;
                    () = cancel.stopped(), if failure.is_none() => {
                        // Dropping the join futures detaches the stage tasks.
                        debug!(in_flight = in_flight.len(), "detaching in-flight stages");
                        return Err(JobOutcome::Abandoned {
                            completed_stages: outputs.len(),
                        });
                    }
                    result = in_flight.next() => result,
                };
                let Some(result) = next else {
                    break;
                };

                if failure.is_some() {
                    debug!(stage = %result.stage, "discarding result after failure in wave");
                    continue;
                }

                match (result.output, result.failure) {
                    (Some(text), None) => {
                        info!(stage = %result.stage, duration_ms = result.duration_ms, "stage completed");
                        events.put(JobEvent::ended(&result.stage));
                        outputs.insert(result.stage.clone(), text);
                        if self.config.emit_progress {
                            events.put(JobEvent::progress(
                                outputs.len(),
                                total,
                                format!("Stage '{}' complete", result.stage),
                            ));
                        }
                    }
                    (_, failure_cause) => {
                        let cause = failure_cause
                            .unwrap_or_else(|| StageFailure::failed("executor returned no output"));
                        let message = cause.describe(&result.stage);
                        error!(stage = %result.stage, error = %cause, duration_ms = result.duration_ms, "stage failed");
                        events.put(JobEvent::stage_error(&result.stage, message));
                        failure = Some((result.stage, cause));
                    }
                }
            }

            if let Some((stage, failure)) = failure {
                return Err(JobOutcome::StageFailed { stage, failure });
            }
        }

        let report = pipeline
            .final_stage()
            .and_then(|stage| outputs.get(&stage.name))
            .unwrap_or_default()
            .to_string();
        Ok(report)
    }

    /// Runs one stage in its own task so a panicking or slow executor never
    /// touches the runner's loop. Dropping the returned future detaches the
    /// task; it is never aborted.
    fn execute_stage(&self, input: StageInput) -> impl Future<Output = StageResult> + Send {
        let executor = Arc::clone(&self.executor);
        let timeout = self.config.stage_timeout();
        let stage = input.stage.clone();
        let span = stage_span(&input.stage, input.step, input.total);
        let timer = SpanTimer::start(stage.clone());

        let handle = tokio::spawn(
            async move {
                match timeout {
                    Some(limit) => tokio::time::timeout(limit, executor.execute(&input))
                        .await
                        .unwrap_or(Err(StageFailure::Timeout)),
                    None => executor.execute(&input).await,
                }
            }
            .instrument(span),
        );

        async move {
            let result = handle
                .await
                .unwrap_or_else(|join_err| Err(StageFailure::Panicked(join_err.to_string())));
            let duration_ms = timer.finish();
            match result {
                Ok(text) => StageResult::ok(stage, text, duration_ms),
                Err(failure) => StageResult::fail(stage, failure, duration_ms),
            }
        }
    }

    async fn persist(
        &self,
        job: &Job,
        report: String,
        events: &EventSender,
        state: &mut JobState,
    ) -> JobOutcome {
        match self.artifacts.save(job.owner_id, &job.prompt, &report).await {
            Ok(artifact_id) => {
                info!(artifact_id = %artifact_id, "artifact persisted");
                events.put(JobEvent::final_result(report.clone()));
                advance(state, JobState::Finished);
                JobOutcome::Completed {
                    artifact_id,
                    report,
                }
            }
            Err(err) => {
                error!(error = %err, "artifact persistence failed");
                let reason = err.to_string();
                events.put(JobEvent::persistence_error(
                    format!("Failed to save analysis: {reason}"),
                    report.clone(),
                ));
                advance(state, JobState::Failed);
                JobOutcome::PersistFailed { report, reason }
            }
        }
    }
}

impl std::fmt::Debug for PipelineRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineRunner")
            .field("executor", &self.executor)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn advance(state: &mut JobState, next: JobState) {
    match state.transition(next) {
        Ok(next) => *state = next,
        Err(err) => error!(error = %err, "job state machine rejected transition"),
    }
}
