//! Per-stage results and the terminal outcome of a job.

use super::{ArtifactId, StageStatus};
use crate::errors::StageFailure;
use serde::{Deserialize, Serialize};

/// The output of one stage execution.
///
/// Produced exactly once per executed stage. Successful results become part
/// of the context handed to dependent stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    /// The stage name.
    pub stage: String,
    /// Whether the stage succeeded.
    pub status: StageStatus,
    /// The stage's text output (successful executions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Why the stage failed (failed executions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<StageFailure>,
    /// Wall-clock time spent in the executor.
    pub duration_ms: f64,
}

impl StageResult {
    /// Creates a successful result.
    #[must_use]
    pub fn ok(stage: impl Into<String>, output: impl Into<String>, duration_ms: f64) -> Self {
        Self {
            stage: stage.into(),
            status: StageStatus::Ok,
            output: Some(output.into()),
            failure: None,
            duration_ms,
        }
    }

    /// Creates a failed result.
    #[must_use]
    pub fn fail(stage: impl Into<String>, failure: StageFailure, duration_ms: f64) -> Self {
        Self {
            stage: stage.into(),
            status: StageStatus::Fail,
            output: None,
            failure: Some(failure),
            duration_ms,
        }
    }

    /// Returns true if the stage succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns the client-facing failure message, if the stage failed.
    #[must_use]
    pub fn failure_message(&self) -> Option<String> {
        self.failure.as_ref().map(|f| f.describe(&self.stage))
    }
}

/// How a job ended, as seen by the runner.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// All stages succeeded and the report was persisted.
    Completed {
        /// The id the store assigned.
        artifact_id: ArtifactId,
        /// The final report text.
        report: String,
    },
    /// A stage failed; later stages never started.
    StageFailed {
        /// The failing stage.
        stage: String,
        /// The failure cause.
        failure: StageFailure,
    },
    /// All stages succeeded but the report could not be saved.
    PersistFailed {
        /// The computed report text.
        report: String,
        /// The store error message.
        reason: String,
    },
    /// The client went away under the abandon policy. In-flight stages were
    /// left to finish on their own; nothing was persisted.
    Abandoned {
        /// Number of stages that had completed when the job was abandoned.
        completed_stages: usize,
    },
}

impl JobOutcome {
    /// Returns true if the report was computed and saved.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Returns the computed report, if the stages got that far.
    #[must_use]
    pub fn report(&self) -> Option<&str> {
        match self {
            Self::Completed { report, .. } | Self::PersistFailed { report, .. } => Some(report),
            Self::StageFailed { .. } | Self::Abandoned { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_result() {
        let result = StageResult::ok("visionary", "A bright future", 12.5);
        assert!(result.is_success());
        assert_eq!(result.output.as_deref(), Some("A bright future"));
        assert!(result.failure_message().is_none());
    }

    #[test]
    fn test_fail_result_message() {
        let result = StageResult::fail("critic", StageFailure::Timeout, 1.0);
        assert!(!result.is_success());
        assert_eq!(
            result.failure_message().as_deref(),
            Some("Stage 'critic' failed: timeout")
        );
    }

    #[test]
    fn test_outcome_report() {
        let outcome = JobOutcome::PersistFailed {
            report: "text".to_string(),
            reason: "db down".to_string(),
        };
        assert_eq!(outcome.report(), Some("text"));
        assert!(!outcome.is_completed());

        let outcome = JobOutcome::StageFailed {
            stage: "a".to_string(),
            failure: StageFailure::failed("x"),
        };
        assert!(outcome.report().is_none());
    }
}
