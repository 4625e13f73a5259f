//! Error types for the stagestream orchestrator.
//!
//! Stage-level failures never escape the pipeline runner as faults; they are
//! converted into [`JobEvent::Error`](crate::core::JobEvent::Error) at the stage
//! boundary. The types here describe those failures, storage failures, and the
//! validation errors a pipeline definition can produce before any job starts.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for stagestream operations.
#[derive(Debug, Error)]
pub enum StagestreamError {
    /// A pipeline definition was rejected.
    #[error("{0}")]
    Validation(#[from] PipelineValidationError),

    /// A dependency cycle was found in a pipeline definition.
    #[error("{0}")]
    CycleDetected(#[from] CycleDetectedError),

    /// A stage failed while executing.
    #[error("{0}")]
    Stage(#[from] StageFailure),

    /// The history or artifact store failed.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// The job state machine was driven through an illegal transition.
    #[error("{0}")]
    InvalidTransition(#[from] InvalidTransitionError),

    /// Invalid orchestrator configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Why a single stage could not produce its output.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum StageFailure {
    /// The executor reported a failure.
    #[error("{0}")]
    Failed(String),

    /// The executor did not answer within the configured stage timeout.
    #[error("timeout")]
    Timeout,

    /// The executor panicked or its task was torn down.
    #[error("stage task aborted: {0}")]
    Panicked(String),
}

impl StageFailure {
    /// Creates an executor failure with a human-readable reason.
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }

    /// Returns true if the failure was a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Formats the message shown to the client for a failure in `stage`.
    #[must_use]
    pub fn describe(&self, stage: &str) -> String {
        format!("Stage '{stage}' failed: {self}")
    }
}

/// Errors reported by history and artifact stores.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The requested artifact does not exist or is not owned by the caller.
    #[error("Artifact not found: {id}")]
    NotFound {
        /// The artifact id that was looked up.
        id: String,
    },
}

impl StoreError {
    /// Creates an unavailable error.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(id: impl ToString) -> Self {
        Self::NotFound { id: id.to_string() }
    }
}

/// Error raised when the job state machine is asked for an illegal move.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid job state transition: {from} -> {to}")]
pub struct InvalidTransitionError {
    /// The state the job was in.
    pub from: String,
    /// The state that was requested.
    pub to: String,
}

impl InvalidTransitionError {
    /// Creates a new invalid transition error.
    #[must_use]
    pub fn new(from: impl ToString, to: impl ToString) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

/// Metadata about a pipeline definition error for better diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContractErrorInfo {
    /// Error code (e.g., "PIPELINE-CYCLE").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ContractErrorInfo {
    /// Creates a new contract error info.
    ///
    /// Known `PIPELINE-*` codes get the matching [`ValidationSuggestions`]
    /// entry as their fix hint.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        let code = code.into();
        let fix_hint = ValidationSuggestions::get(&code).map(str::to_string);
        Self {
            code,
            summary: summary.into(),
            fix_hint,
            context: HashMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("code".to_string(), serde_json::json!(self.code));
        map.insert("summary".to_string(), serde_json::json!(self.summary));

        if let Some(ref hint) = self.fix_hint {
            map.insert("fix_hint".to_string(), serde_json::json!(hint));
        }
        if !self.context.is_empty() {
            map.insert("context".to_string(), serde_json::json!(self.context));
        }

        map
    }
}

/// Error raised when a pipeline definition fails validation.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PipelineValidationError {
    /// The error message.
    pub message: String,
    /// The stages involved in the error.
    pub stages: Vec<String>,
    /// Optional contract error info.
    pub error_info: Option<ContractErrorInfo>,
}

impl PipelineValidationError {
    /// Creates a new pipeline validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stages: Vec::new(),
            error_info: None,
        }
    }

    /// Sets the stages involved.
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<String>) -> Self {
        self.stages = stages;
        self
    }

    /// Sets the contract error info.
    #[must_use]
    pub fn with_error_info(mut self, info: ContractErrorInfo) -> Self {
        self.error_info = Some(info);
        self
    }

    /// Returns the error code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.error_info.as_ref().map(|info| info.code.as_str())
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("message".to_string(), serde_json::json!(self.message));
        map.insert("stages".to_string(), serde_json::json!(self.stages));
        if let Some(ref info) = self.error_info {
            let info_map: serde_json::Map<String, serde_json::Value> =
                info.to_dict().into_iter().collect();
            map.insert("error_info".to_string(), serde_json::Value::Object(info_map));
        }
        map
    }
}

/// Error raised when a cycle is detected in the stage graph.
#[derive(Debug, Clone, Error)]
#[error("Cycle detected in pipeline: {}", cycle_path.join(" -> "))]
pub struct CycleDetectedError {
    /// The path of stages forming the cycle.
    pub cycle_path: Vec<String>,
    /// Contract error info.
    pub error_info: ContractErrorInfo,
}

impl CycleDetectedError {
    /// Creates a new cycle detected error.
    #[must_use]
    pub fn new(cycle_path: Vec<String>) -> Self {
        let info = ContractErrorInfo::new(
            "PIPELINE-CYCLE",
            format!("Pipeline contains a dependency cycle: {}", cycle_path.join(" -> ")),
        )
        .with_fix_hint("Remove one of the dependencies in the cycle to break it.");

        Self {
            cycle_path,
            error_info: info,
        }
    }
}

impl From<CycleDetectedError> for PipelineValidationError {
    fn from(err: CycleDetectedError) -> Self {
        Self {
            message: err.to_string(),
            stages: err.cycle_path.clone(),
            error_info: Some(err.error_info),
        }
    }
}

/// Provides default suggestions for pipeline validation error codes.
pub struct ValidationSuggestions;

impl ValidationSuggestions {
    /// Gets a suggestion for a given error code.
    #[must_use]
    pub fn get(code: &str) -> Option<&'static str> {
        match code {
            "PIPELINE-CYCLE" => Some(
                "Check your stage dependencies for circular references. \
                 Each stage may only consume outputs of stages that finish before it.",
            ),
            "PIPELINE-MISSING_DEP" => Some(
                "Ensure all dependencies reference stages that exist in the pipeline. \
                 Check for typos in stage names.",
            ),
            "PIPELINE-DUPLICATE" => Some("Stage names must be unique within a pipeline."),
            "PIPELINE-EMPTY" => Some("Add at least one stage to the pipeline before building."),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_failure_describe_names_stage() {
        let failure = StageFailure::Timeout;
        assert_eq!(failure.describe("critic"), "Stage 'critic' failed: timeout");
        assert!(failure.is_timeout());

        let failure = StageFailure::failed("rate limited");
        assert_eq!(
            failure.describe("market_analyst"),
            "Stage 'market_analyst' failed: rate limited"
        );
    }

    #[test]
    fn test_stage_failure_serialization() {
        let json = serde_json::to_value(StageFailure::failed("boom")).unwrap();
        assert_eq!(json["kind"], "failed");
        assert_eq!(json["reason"], "boom");
    }

    #[test]
    fn test_pipeline_validation_error_to_dict() {
        let err = PipelineValidationError::new("Test error")
            .with_stages(vec!["stage1".to_string(), "stage2".to_string()])
            .with_error_info(ContractErrorInfo::new("PIPELINE-EMPTY", "empty"));

        let dict = err.to_dict();
        assert_eq!(dict.get("message").unwrap(), "Test error");
        assert_eq!(err.code(), Some("PIPELINE-EMPTY"));
        assert!(dict.contains_key("error_info"));
    }

    #[test]
    fn test_cycle_detected_error() {
        let err = CycleDetectedError::new(vec![
            "a".to_string(),
            "b".to_string(),
            "a".to_string(),
        ]);

        assert!(err.to_string().contains("a -> b -> a"));
        assert_eq!(err.error_info.code, "PIPELINE-CYCLE");

        let validation: PipelineValidationError = err.into();
        assert_eq!(validation.code(), Some("PIPELINE-CYCLE"));
    }

    #[test]
    fn test_store_error_wraps_into_top_level() {
        let err: StagestreamError = StoreError::unavailable("db down").into();
        assert_eq!(err.to_string(), "Store unavailable: db down");
    }

    #[test]
    fn test_validation_suggestions() {
        assert!(ValidationSuggestions::get("PIPELINE-CYCLE").is_some());
        assert!(ValidationSuggestions::get("UNKNOWN").is_none());
    }

    #[test]
    fn test_known_codes_get_default_hint() {
        let info = ContractErrorInfo::new("PIPELINE-DUPLICATE", "dup");
        assert_eq!(
            info.fix_hint.as_deref(),
            Some("Stage names must be unique within a pipeline.")
        );
        assert!(ContractErrorInfo::new("OTHER", "x").fix_hint.is_none());
    }
}
