//! Stage definitions and job specifications.

use super::Pipeline;
use crate::errors::{ContractErrorInfo, PipelineValidationError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Placeholder replaced by the job prompt in stage descriptions.
pub const IDEA_PLACEHOLDER: &str = "{idea}";

/// Definition of a single stage in a pipeline.
///
/// Immutable once a job referencing it starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDefinition {
    /// The unique name of the stage.
    pub name: String,
    /// Role label of the agent performing the stage.
    #[serde(default)]
    pub role: String,
    /// Task description; `{idea}` is replaced by the job prompt.
    #[serde(default)]
    pub description: String,
    /// Hint describing the expected output.
    #[serde(default)]
    pub expected_output: String,
    /// Names of stages whose outputs this stage consumes, in context order.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl StageDefinition {
    /// Creates a new stage definition.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: String::new(),
            description: String::new(),
            expected_output: String::new(),
            dependencies: Vec::new(),
        }
    }

    /// Sets the role label.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    /// Sets the description template.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the expected-output hint.
    #[must_use]
    pub fn with_expected_output(mut self, expected: impl Into<String>) -> Self {
        self.expected_output = expected.into();
        self
    }

    /// Sets the dependencies.
    #[must_use]
    pub fn with_dependencies(mut self, deps: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a dependency. Repeated names are ignored.
    #[must_use]
    pub fn with_dependency(mut self, dep: impl Into<String>) -> Self {
        let dep = dep.into();
        if !self.dependencies.contains(&dep) {
            self.dependencies.push(dep);
        }
        self
    }

    /// Returns the description with the prompt substituted in.
    #[must_use]
    pub fn render_description(&self, prompt: &str) -> String {
        self.description.replace(IDEA_PLACEHOLDER, prompt)
    }

    /// Validates the stage definition on its own.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank, a dependency is repeated, or
    /// the stage depends on itself.
    pub fn validate(&self) -> Result<(), PipelineValidationError> {
        if self.name.trim().is_empty() {
            return Err(PipelineValidationError::new("Stage name cannot be empty")
                .with_error_info(ContractErrorInfo::new(
                    "PIPELINE-INVALID_STAGE",
                    "Stage name cannot be empty or whitespace-only",
                )));
        }
        if self.dependencies.contains(&self.name) {
            return Err(PipelineValidationError::new(format!(
                "Stage '{}' cannot depend on itself",
                self.name
            ))
            .with_stages(vec![self.name.clone()])
            .with_error_info(ContractErrorInfo::new(
                "PIPELINE-CYCLE",
                format!("Stage '{}' lists itself as a dependency", self.name),
            )));
        }
        for (i, dep) in self.dependencies.iter().enumerate() {
            if self.dependencies[..i].contains(dep) {
                return Err(PipelineValidationError::new(format!(
                    "Stage '{}' lists dependency '{}' twice",
                    self.name, dep
                ))
                .with_stages(vec![self.name.clone(), dep.clone()])
                .with_error_info(ContractErrorInfo::new(
                    "PIPELINE-DUPLICATE",
                    format!("Dependency '{dep}' is repeated"),
                )));
            }
        }
        Ok(())
    }
}

/// Where a job's history context comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HistorySource {
    /// No history context.
    #[default]
    None,
    /// The runner fetches recent artifacts for the owner, best-effort.
    Fetch,
    /// A pre-assembled history blob.
    Provided(String),
}

/// One invocation of a pipeline.
#[derive(Debug, Clone)]
pub struct Job {
    /// Request-scoped job id.
    pub id: Uuid,
    /// The user the job runs for.
    pub owner_id: Uuid,
    /// The input idea/prompt text.
    pub prompt: String,
    /// Where the first stage's history context comes from.
    pub history: HistorySource,
    /// The validated stage graph.
    pub pipeline: Arc<Pipeline>,
}

impl Job {
    /// Creates a job without history context.
    #[must_use]
    pub fn new(owner_id: Uuid, prompt: impl Into<String>, pipeline: Arc<Pipeline>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            prompt: prompt.into(),
            history: HistorySource::None,
            pipeline,
        }
    }

    /// Sets the job id.
    #[must_use]
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Enables or disables fetching history from the history store.
    #[must_use]
    pub fn with_history(mut self, use_history: bool) -> Self {
        self.history = if use_history {
            HistorySource::Fetch
        } else {
            HistorySource::None
        };
        self
    }

    /// Uses a pre-assembled history context.
    #[must_use]
    pub fn with_history_context(mut self, context: impl Into<String>) -> Self {
        self.history = HistorySource::Provided(context.into());
        self
    }
}
