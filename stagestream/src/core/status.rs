//! Stage status and the per-job state machine.

use crate::errors::InvalidTransitionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The execution status of a single stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Stage completed successfully.
    Ok,
    /// Stage failed.
    Fail,
}

impl StageStatus {
    /// Returns true if the status indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

/// Lifecycle of one job.
///
/// `Idle -> Running(0) -> Running(1) -> ... -> Finished | Failed -> Closed`.
/// `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobState {
    /// Created, no stage started yet.
    Idle,
    /// The stage with this zero-based start index is running.
    Running {
        /// Zero-based index of the most recently started stage.
        stage: usize,
    },
    /// A stage or the final persist failed.
    Failed,
    /// All stages succeeded and the artifact was handled.
    Finished,
    /// `Done` has been emitted.
    Closed,
}

impl JobState {
    /// Returns true if moving from `self` to `next` is legal.
    #[must_use]
    pub fn can_transition_to(&self, next: &Self) -> bool {
        match (self, next) {
            (Self::Idle, Self::Running { stage: 0 }) => true,
            (Self::Idle | Self::Running { .. }, Self::Failed) => true,
            (Self::Running { stage: current }, Self::Running { stage: upcoming }) => {
                *upcoming == current + 1
            }
            (Self::Running { .. }, Self::Finished) => true,
            (Self::Finished | Self::Failed, Self::Closed) => true,
            _ => false,
        }
    }

    /// Moves to `next`, rejecting illegal transitions.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransitionError`] if the transition is not allowed.
    pub fn transition(self, next: Self) -> Result<Self, InvalidTransitionError> {
        if self.can_transition_to(&next) {
            Ok(next)
        } else {
            Err(InvalidTransitionError::new(self, next))
        }
    }

    /// Returns true once `Done` has been emitted.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl Default for JobState {
    fn default() -> Self {
        Self::Idle
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running { stage } => write!(f, "running({stage})"),
            Self::Failed => write!(f, "failed"),
            Self::Finished => write!(f, "finished"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let state = JobState::Idle
            .transition(JobState::Running { stage: 0 })
            .and_then(|s| s.transition(JobState::Running { stage: 1 }))
            .and_then(|s| s.transition(JobState::Finished))
            .and_then(|s| s.transition(JobState::Closed))
            .unwrap();
        assert!(state.is_closed());
    }

    #[test]
    fn test_failure_path() {
        let state = JobState::Running { stage: 1 }
            .transition(JobState::Failed)
            .and_then(|s| s.transition(JobState::Closed))
            .unwrap();
        assert_eq!(state, JobState::Closed);
    }

    #[test]
    fn test_stage_index_cannot_skip() {
        let err = JobState::Running { stage: 0 }
            .transition(JobState::Running { stage: 2 })
            .unwrap_err();
        assert_eq!(err.from, "running(0)");
        assert_eq!(err.to, "running(2)");
    }

    #[test]
    fn test_closed_is_terminal() {
        for next in [
            JobState::Idle,
            JobState::Running { stage: 0 },
            JobState::Failed,
            JobState::Finished,
            JobState::Closed,
        ] {
            assert!(!JobState::Closed.can_transition_to(&next));
        }
    }

    #[test]
    fn test_idle_cannot_finish_or_close() {
        assert!(!JobState::Idle.can_transition_to(&JobState::Finished));
        assert!(!JobState::Idle.can_transition_to(&JobState::Closed));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(StageStatus::Ok.to_string(), "ok");
        assert_eq!(StageStatus::Fail.to_string(), "fail");
        assert!(StageStatus::Ok.is_success());
    }
}
