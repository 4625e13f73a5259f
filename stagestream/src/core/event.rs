//! Job event type carried on the event channel.

use serde::{Deserialize, Serialize};

/// An event produced while a job runs.
///
/// Events are produced by the pipeline runner or the heartbeat ticker and
/// consumed exactly once by the job coordinator. The serialized form is the
/// wire JSON: a `type` discriminator plus type-specific fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JobEvent {
    /// A stage began executing.
    #[serde(rename = "agent_start")]
    Started {
        /// The stage name.
        #[serde(rename = "agent")]
        stage: String,
    },

    /// Step counter for UI progress bars.
    #[serde(rename = "progress")]
    Progress {
        /// Number of stages completed so far.
        step: usize,
        /// Total number of stages in the job.
        total: usize,
        /// Human-readable progress note.
        message: String,
    },

    /// A stage finished successfully.
    #[serde(rename = "agent_end")]
    Ended {
        /// The stage name.
        #[serde(rename = "agent")]
        stage: String,
    },

    /// Keep-alive with no payload.
    #[serde(rename = "heartbeat")]
    Heartbeat,

    /// The final report text.
    #[serde(rename = "final_result")]
    FinalResult {
        /// The report text.
        #[serde(rename = "result")]
        text: String,
    },

    /// The job failed.
    #[serde(rename = "error")]
    Error {
        /// Human-readable failure description.
        message: String,
        /// The failing stage, when the failure belongs to one.
        #[serde(rename = "agent", default, skip_serializing_if = "Option::is_none")]
        stage: Option<String>,
        /// Text that was computed before the failure (persistence failures).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<String>,
    },

    /// Terminal sentinel; always the last event of a job.
    #[serde(rename = "completed")]
    Done,
}

impl JobEvent {
    /// Creates a `Started` event.
    #[must_use]
    pub fn started(stage: impl Into<String>) -> Self {
        Self::Started {
            stage: stage.into(),
        }
    }

    /// Creates an `Ended` event.
    #[must_use]
    pub fn ended(stage: impl Into<String>) -> Self {
        Self::Ended {
            stage: stage.into(),
        }
    }

    /// Creates a `Progress` event.
    #[must_use]
    pub fn progress(step: usize, total: usize, message: impl Into<String>) -> Self {
        Self::Progress {
            step,
            total,
            message: message.into(),
        }
    }

    /// Creates a `FinalResult` event.
    #[must_use]
    pub fn final_result(text: impl Into<String>) -> Self {
        Self::FinalResult { text: text.into() }
    }

    /// Creates an `Error` event not tied to a stage.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            stage: None,
            result: None,
        }
    }

    /// Creates an `Error` event for a failed stage.
    #[must_use]
    pub fn stage_error(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            stage: Some(stage.into()),
            result: None,
        }
    }

    /// Creates an `Error` event that still carries the computed report.
    #[must_use]
    pub fn persistence_error(message: impl Into<String>, result: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            stage: None,
            result: Some(result.into()),
        }
    }

    /// Returns the wire `type` discriminator for this event.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Started { .. } => "agent_start",
            Self::Progress { .. } => "progress",
            Self::Ended { .. } => "agent_end",
            Self::Heartbeat => "heartbeat",
            Self::FinalResult { .. } => "final_result",
            Self::Error { .. } => "error",
            Self::Done => "completed",
        }
    }

    /// Returns the stage this event refers to, if any.
    #[must_use]
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::Started { stage } | Self::Ended { stage } => Some(stage),
            Self::Error { stage, .. } => stage.as_deref(),
            _ => None,
        }
    }

    /// Returns true for `FinalResult` and `Error`.
    #[must_use]
    pub fn is_terminal_result(&self) -> bool {
        matches!(self, Self::FinalResult { .. } | Self::Error { .. })
    }

    /// Returns true for the `Done` sentinel.
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true for keep-alive events.
    #[must_use]
    pub fn is_heartbeat(&self) -> bool {
        matches!(self, Self::Heartbeat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_wire_discriminators() {
        assert_eq!(JobEvent::started("a").kind(), "agent_start");
        assert_eq!(JobEvent::ended("a").kind(), "agent_end");
        assert_eq!(JobEvent::progress(1, 4, "x").kind(), "progress");
        assert_eq!(JobEvent::final_result("r").kind(), "final_result");
        assert_eq!(JobEvent::error("e").kind(), "error");
        assert_eq!(JobEvent::Done.kind(), "completed");
    }

    #[test]
    fn test_started_serializes_agent_field() {
        let json = serde_json::to_value(JobEvent::started("visionary")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "agent_start", "agent": "visionary"}));
    }

    #[test]
    fn test_final_result_serializes_result_field() {
        let json = serde_json::to_value(JobEvent::final_result("# Report")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "final_result", "result": "# Report"}));
    }

    #[test]
    fn test_error_omits_absent_fields() {
        let json = serde_json::to_value(JobEvent::error("bad")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "error", "message": "bad"}));

        let json = serde_json::to_value(JobEvent::persistence_error("save failed", "text")).unwrap();
        assert_eq!(json["result"], "text");
    }

    #[test]
    fn test_done_round_trips_from_wire() {
        let event: JobEvent = serde_json::from_str(r#"{"type":"completed"}"#).unwrap();
        assert!(event.is_done());
    }

    #[test]
    fn test_stage_accessor() {
        assert_eq!(JobEvent::stage_error("critic", "x").stage(), Some("critic"));
        assert_eq!(JobEvent::Heartbeat.stage(), None);
        assert!(JobEvent::error("x").is_terminal_result());
        assert!(!JobEvent::Done.is_terminal_result());
    }
}
