//! The four-stage venture analysis pipeline.

use super::{Pipeline, PipelineBuilder, StageDefinition};
use crate::errors::PipelineValidationError;

/// Stage names of the venture analysis pipeline, in execution order.
pub const VENTURE_STAGES: [&str; 4] = ["visionary", "market_analyst", "critic", "planner"];

/// Builds the venture analysis pipeline.
///
/// visionary -> market_analyst -> critic -> planner, where each later stage
/// reads the outputs of every stage before it. The planner's output is the
/// final report.
///
/// # Errors
///
/// Never fails in practice; the builder error is propagated rather than
/// unwrapped.
pub fn venture_analysis() -> Result<Pipeline, PipelineValidationError> {
    PipelineBuilder::new("venture_analysis")
        .stage(
            StageDefinition::new("visionary")
                .with_role("Creative Product Visionary")
                .with_description("Create a compelling vision for: '{idea}'.")
                .with_expected_output("An inspiring paragraph."),
        )?
        .stage(
            StageDefinition::new("market_analyst")
                .with_role("Data-Driven Market Analyst")
                .with_description("Analyze the market for '{idea}'.")
                .with_expected_output("A summary of market trends.")
                .with_dependency("visionary"),
        )?
        .stage(
            StageDefinition::new("critic")
                .with_role("Realistic Risk Manager")
                .with_description("Critically evaluate the idea for '{idea}'.")
                .with_expected_output("A bullet list of risks.")
                .with_dependencies(["visionary", "market_analyst"]),
        )?
        .stage(
            StageDefinition::new("planner")
                .with_role("Pragmatic Strategy Consultant")
                .with_description("Synthesize all information into a final report.")
                .with_expected_output("A comprehensive report in Markdown.")
                .with_dependencies(["visionary", "market_analyst", "critic"]),
        )?
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_venture_pipeline_shape() {
        let pipeline = venture_analysis().unwrap();

        assert_eq!(pipeline.execution_order(), VENTURE_STAGES.to_vec());
        assert_eq!(pipeline.waves().len(), 4);
        assert_eq!(
            pipeline.stage("planner").unwrap().dependencies,
            vec!["visionary", "market_analyst", "critic"]
        );
    }

    #[test]
    fn test_descriptions_take_the_idea() {
        let pipeline = venture_analysis().unwrap();
        let critic = pipeline.stage("critic").unwrap();
        assert_eq!(
            critic.render_description("vertical farms"),
            "Critically evaluate the idea for 'vertical farms'."
        );
    }
}
