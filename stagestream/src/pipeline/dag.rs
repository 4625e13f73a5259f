//! Validated stage graph.
//!
//! Stages are grouped into waves: a wave is a set of stages whose
//! dependencies all live in earlier waves. Execution order is the waves
//! flattened, with declaration order kept inside each wave.

use super::StageDefinition;
use std::collections::{HashMap, VecDeque};

/// A validated, immutable pipeline of stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    name: String,
    /// Stages in execution order.
    stages: Vec<StageDefinition>,
    /// Indices into `stages`, grouped by dependency depth.
    waves: Vec<Vec<usize>>,
}

impl Pipeline {
    /// Creates a pipeline from definitions that have already been validated
    /// as acyclic with resolvable dependencies.
    pub(crate) fn new(name: String, definitions: Vec<StageDefinition>) -> Self {
        let stages = topological_sort(definitions);
        let waves = compute_waves(&stages);
        Self {
            name,
            stages,
            waves,
        }
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the stages in execution order.
    #[must_use]
    pub fn stages(&self) -> &[StageDefinition] {
        &self.stages
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Returns the stage names in execution order.
    #[must_use]
    pub fn execution_order(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }

    /// Returns stage indices grouped into dependency waves.
    #[must_use]
    pub fn waves(&self) -> &[Vec<usize>] {
        &self.waves
    }

    /// Looks up a stage by name.
    #[must_use]
    pub fn stage(&self, name: &str) -> Option<&StageDefinition> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Returns the stage whose output becomes the job result.
    #[must_use]
    pub fn final_stage(&self) -> Option<&StageDefinition> {
        self.stages.last()
    }
}

/// Orders stages by dependency depth, then by declaration.
///
/// Depths come from Kahn's algorithm; sorting on them keeps every wave
/// contiguous in the resulting order.
fn topological_sort(definitions: Vec<StageDefinition>) -> Vec<StageDefinition> {
    let index: HashMap<&str, usize> = definitions
        .iter()
        .enumerate()
        .map(|(i, d)| (d.name.as_str(), i))
        .collect();

    let mut in_degree: Vec<usize> = definitions.iter().map(|d| d.dependencies.len()).collect();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); definitions.len()];
    for (i, def) in definitions.iter().enumerate() {
        for dep in &def.dependencies {
            if let Some(&j) = index.get(dep.as_str()) {
                dependents[j].push(i);
            }
        }
    }

    let mut depth = vec![0usize; definitions.len()];
    let mut ready: VecDeque<usize> = (0..definitions.len()).filter(|&i| in_degree[i] == 0).collect();
    while let Some(next) = ready.pop_front() {
        for &child in &dependents[next] {
            depth[child] = depth[child].max(depth[next] + 1);
            in_degree[child] = in_degree[child].saturating_sub(1);
            if in_degree[child] == 0 {
                ready.push_back(child);
            }
        }
    }

    let mut order: Vec<usize> = (0..definitions.len()).collect();
    order.sort_by_key(|&i| (depth[i], i));

    let mut slots: Vec<Option<StageDefinition>> = definitions.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect()
}

fn compute_waves(stages: &[StageDefinition]) -> Vec<Vec<usize>> {
    let mut depth: HashMap<&str, usize> = HashMap::new();
    let mut waves: Vec<Vec<usize>> = Vec::new();

    for (i, stage) in stages.iter().enumerate() {
        let level = stage
            .dependencies
            .iter()
            .filter_map(|dep| depth.get(dep.as_str()))
            .map(|d| d + 1)
            .max()
            .unwrap_or(0);
        depth.insert(stage.name.as_str(), level);
        if waves.len() <= level {
            waves.resize_with(level + 1, Vec::new);
        }
        waves[level].push(i);
    }

    waves
}
