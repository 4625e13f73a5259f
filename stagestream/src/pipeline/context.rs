//! Per-stage context assembly.

use super::StageDefinition;
use crate::stages::StageInput;
use crate::store::HistoryEntry;
use std::collections::HashMap;

const HISTORY_HEADER: &str = "For context, this user has previously analyzed:";
const HISTORY_FOOTER: &str = "Keep these past analyses in mind when creating the new vision.";

/// Summarizes prior artifacts into the history context for the first stage.
///
/// Returns `None` when there is no history. Each entry contributes its prompt
/// and the first `prefix_chars` characters of its report.
#[must_use]
pub fn build_history_context(entries: &[HistoryEntry], prefix_chars: usize) -> Option<String> {
    if entries.is_empty() {
        return None;
    }

    let summary: Vec<String> = entries
        .iter()
        .map(|entry| {
            let finding: String = entry.result.chars().take(prefix_chars).collect();
            format!("- Idea: '{}'. Key finding: {}...", entry.prompt, finding)
        })
        .collect();

    Some(format!(
        "{HISTORY_HEADER}\n{}\n{HISTORY_FOOTER}",
        summary.join("\n")
    ))
}

/// Outputs of completed stages, keyed by stage name.
#[derive(Debug, Default, Clone)]
pub struct StageOutputs {
    outputs: HashMap<String, String>,
}

impl StageOutputs {
    /// Creates an empty output map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a stage's output.
    pub fn insert(&mut self, stage: impl Into<String>, output: impl Into<String>) {
        self.outputs.insert(stage.into(), output.into());
    }

    /// Returns a stage's output.
    #[must_use]
    pub fn get(&self, stage: &str) -> Option<&str> {
        self.outputs.get(stage).map(String::as_str)
    }

    /// Returns the number of recorded outputs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Concatenates the outputs of `dependencies` in the given order.
    #[must_use]
    pub fn context_for(&self, dependencies: &[String]) -> String {
        dependencies
            .iter()
            .filter_map(|dep| self.get(dep))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Builds the executor input for one stage.
///
/// `history` is only passed for the first stage in execution order.
#[must_use]
pub fn stage_input(
    definition: &StageDefinition,
    prompt: &str,
    outputs: &StageOutputs,
    history: Option<&str>,
    step: usize,
    total: usize,
) -> StageInput {
    let mut context = outputs.context_for(&definition.dependencies);
    if let Some(history) = history {
        if context.is_empty() {
            context = history.to_string();
        } else {
            context = format!("{history}\n\n{context}");
        }
    }

    StageInput {
        stage: definition.name.clone(),
        role: definition.role.clone(),
        description: definition.render_description(prompt),
        expected_output: definition.expected_output.clone(),
        context,
        step,
        total,
    }
}
