//! Pipeline builder with validation.

use super::{Pipeline, StageDefinition};
use crate::errors::{ContractErrorInfo, CycleDetectedError, PipelineValidationError};
use std::collections::{HashMap, HashSet};

/// Builder for creating validated pipelines.
///
/// Stages added one at a time with [`PipelineBuilder::stage`] may only depend
/// on stages added before them. Definitions loaded as a set with
/// [`PipelineBuilder::from_definitions`] may appear in any order and are
/// checked for missing dependencies and cycles at [`PipelineBuilder::build`].
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    /// The pipeline name.
    name: String,
    /// The stage definitions in declaration order.
    stages: Vec<StageDefinition>,
}

impl PipelineBuilder {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    /// Creates a builder from an unordered set of definitions.
    #[must_use]
    pub fn from_definitions(
        name: impl Into<String>,
        definitions: impl IntoIterator<Item = StageDefinition>,
    ) -> Self {
        Self {
            name: name.into(),
            stages: definitions.into_iter().collect(),
        }
    }

    /// Adds a stage to the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the definition is invalid, the name is taken, or
    /// a dependency has not been added yet.
    pub fn stage(mut self, definition: StageDefinition) -> Result<Self, PipelineValidationError> {
        self.add_stage(definition)?;
        Ok(self)
    }

    /// Adds a stage definition in place.
    ///
    /// # Errors
    ///
    /// See [`PipelineBuilder::stage`].
    pub fn add_stage(&mut self, definition: StageDefinition) -> Result<(), PipelineValidationError> {
        definition.validate()?;

        if self.contains(&definition.name) {
            return Err(duplicate_error(&definition.name));
        }
        for dep in &definition.dependencies {
            if !self.contains(dep) {
                return Err(missing_dependency_error(&definition.name, dep));
            }
        }

        self.stages.push(definition);
        Ok(())
    }

    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the builder has no stages, or if any definition is
    /// invalid, duplicated, depends on an unknown stage, or forms a cycle.
    pub fn build(self) -> Result<Pipeline, PipelineValidationError> {
        if self.stages.is_empty() {
            return Err(PipelineValidationError::new("Pipeline has no stages").with_error_info(
                ContractErrorInfo::new("PIPELINE-EMPTY", "Cannot build an empty pipeline"),
            ));
        }

        let mut seen = HashSet::new();
        for def in &self.stages {
            def.validate()?;
            if !seen.insert(def.name.as_str()) {
                return Err(duplicate_error(&def.name));
            }
        }
        for def in &self.stages {
            if let Some(dep) = def.dependencies.iter().find(|d| !seen.contains(d.as_str())) {
                return Err(missing_dependency_error(&def.name, dep));
            }
        }

        self.detect_cycles()?;

        Ok(Pipeline::new(self.name, self.stages))
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    fn contains(&self, name: &str) -> bool {
        self.stages.iter().any(|s| s.name == name)
    }

    /// Detects cycles in the dependency graph.
    fn detect_cycles(&self) -> Result<(), CycleDetectedError> {
        let graph: HashMap<&str, &[String]> = self
            .stages
            .iter()
            .map(|s| (s.name.as_str(), s.dependencies.as_slice()))
            .collect();

        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();

        // Declaration order keeps the reported cycle deterministic.
        for stage in &self.stages {
            if !visited.contains(stage.name.as_str()) {
                if let Some(cycle) =
                    dfs_cycle(&graph, &stage.name, &mut visited, &mut rec_stack, &mut path)
                {
                    return Err(CycleDetectedError::new(cycle));
                }
            }
        }

        Ok(())
    }
}

fn dfs_cycle<'a>(
    graph: &HashMap<&'a str, &'a [String]>,
    node: &'a str,
    visited: &mut HashSet<&'a str>,
    rec_stack: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
) -> Option<Vec<String>> {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node);

    if let Some(&deps) = graph.get(node) {
        for dep in deps {
            let dep = dep.as_str();
            if !visited.contains(dep) {
                if let Some(cycle) = dfs_cycle(graph, dep, visited, rec_stack, path) {
                    return Some(cycle);
                }
            } else if rec_stack.contains(dep) {
                let start = path.iter().position(|n| *n == dep).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].iter().map(|n| (*n).to_string()).collect();
                cycle.push(dep.to_string());
                return Some(cycle);
            }
        }
    }

    path.pop();
    rec_stack.remove(node);
    None
}

fn duplicate_error(name: &str) -> PipelineValidationError {
    PipelineValidationError::new(format!("Stage '{name}' is defined more than once"))
        .with_stages(vec![name.to_string()])
        .with_error_info(
            ContractErrorInfo::new("PIPELINE-DUPLICATE", format!("Duplicate stage '{name}'"))
                .with_context_entry("stage", name),
        )
}

fn missing_dependency_error(stage: &str, dep: &str) -> PipelineValidationError {
    PipelineValidationError::new(format!("Stage '{stage}' depends on unknown stage '{dep}'"))
        .with_stages(vec![stage.to_string(), dep.to_string()])
        .with_error_info(
            ContractErrorInfo::new("PIPELINE-MISSING_DEP", format!("Dependency '{dep}' not found"))
                .with_fix_hint(
                    "Ensure the dependency is added before the stage that depends on it.",
                )
                .with_context_entry("stage", stage)
                .with_context_entry("dependency", dep),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(name: &str, deps: &[&str]) -> StageDefinition {
        StageDefinition::new(name).with_dependencies(deps.iter().copied())
    }

    #[test]
    fn test_builder_creation() {
        let builder = PipelineBuilder::new("test");
        assert_eq!(builder.name(), "test");
        assert_eq!(builder.stage_count(), 0);
    }

    #[test]
    fn test_builder_with_dependencies() {
        let builder = PipelineBuilder::new("test")
            .stage(def("stage1", &[]))
            .unwrap()
            .stage(def("stage2", &["stage1"]))
            .unwrap();

        assert_eq!(builder.stage_count(), 2);
    }

    #[test]
    fn test_builder_missing_dependency() {
        let err = PipelineBuilder::new("test")
            .stage(def("stage1", &["missing"]))
            .unwrap_err();

        assert_eq!(err.code(), Some("PIPELINE-MISSING_DEP"));
        assert_eq!(err.stages, vec!["stage1", "missing"]);

        let info = err.error_info.as_ref().unwrap();
        assert_eq!(info.context.get("dependency").map(String::as_str), Some("missing"));
        let dict = info.to_dict();
        assert_eq!(dict["context"]["stage"], "stage1");
    }

    #[test]
    fn test_builder_duplicate_stage() {
        let err = PipelineBuilder::new("test")
            .stage(def("a", &[]))
            .unwrap()
            .stage(def("a", &[]))
            .unwrap_err();

        assert_eq!(err.code(), Some("PIPELINE-DUPLICATE"));
    }

    #[test]
    fn test_builder_empty_build() {
        let err = PipelineBuilder::new("test").build().unwrap_err();
        assert_eq!(err.code(), Some("PIPELINE-EMPTY"));
    }

    #[test]
    fn test_from_definitions_detects_cycle() {
        let err = PipelineBuilder::from_definitions(
            "loop",
            vec![def("a", &["c"]), def("b", &["a"]), def("c", &["b"])],
        )
        .build()
        .unwrap_err();

        assert_eq!(err.code(), Some("PIPELINE-CYCLE"));
        assert_eq!(err.stages.first().map(String::as_str), Some("a"));
        assert_eq!(err.stages.last().map(String::as_str), Some("a"));
    }

    #[test]
    fn test_from_definitions_missing_dependency() {
        let err = PipelineBuilder::from_definitions("bad", vec![def("a", &["ghost"])])
            .build()
            .unwrap_err();
        assert_eq!(err.code(), Some("PIPELINE-MISSING_DEP"));
    }

    #[test]
    fn test_from_definitions_sorts() {
        let pipeline = PipelineBuilder::from_definitions(
            "ok",
            vec![def("plan", &["vision"]), def("vision", &[])],
        )
        .build()
        .unwrap();
        assert_eq!(pipeline.execution_order(), vec!["vision", "plan"]);
    }

    #[test]
    fn test_builder_build_success() {
        let pipeline = PipelineBuilder::new("test")
            .stage(def("stage1", &[]))
            .unwrap()
            .stage(def("stage2", &["stage1"]))
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(pipeline.name(), "test");
        assert_eq!(pipeline.stage_count(), 2);
    }
}
