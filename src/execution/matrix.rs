//! Matrix expansion - one job per declared environment

use crate::core::{ConfigurationError, Job, Pipeline};
use tracing::debug;

/// Expands a pipeline definition into jobs
pub struct MatrixExpander;

impl MatrixExpander {
    /// Build one job per environment, in declaration order
    ///
    /// Each job holds, in declaration order, the steps whose predicate holds
    /// for its environment. A step that applies nowhere is not an error.
    pub fn expand(pipeline: &Pipeline) -> Result<Vec<Job>, ConfigurationError> {
        pipeline.validate()?;

        let jobs: Vec<Job> = pipeline
            .matrix
            .iter()
            .map(|entry| {
                let steps = pipeline
                    .steps
                    .iter()
                    .filter(|step| step.applies_to(&entry.environment))
                    .cloned()
                    .collect();
                Job::new(entry.environment.clone(), entry.env.clone(), steps)
            })
            .collect();

        for step in &pipeline.steps {
            if !jobs.iter().any(|job| job.steps.iter().any(|s| s.name == step.name)) {
                debug!(step = %step.name, predicate = %step.predicate, "Step applies to no declared environment");
            }
        }

        Ok(jobs)
    }
}
