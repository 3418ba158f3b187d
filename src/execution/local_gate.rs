//! Local gate - the pre-push subset of a pipeline, run on this machine only
//!
//! The gate is the leading run of steps marked `local`. It has no matrix: the
//! steps execute as a single job in an implicit local environment, under the
//! pipeline's global scope, with the same fail-fast rule as any other job.

use crate::{
    core::{ConfigurationError, EnvScope, Environment, Job, JobReport, Pipeline, Step},
    execution::{events::EventBus, executor::JobExecutor},
    invoker::StepInvoker,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct LocalGate {
    pipeline: String,
    env: EnvScope,
    steps: Vec<Step>,
}

impl LocalGate {
    /// Take the local prefix of a validated pipeline
    pub fn from_pipeline(pipeline: &Pipeline) -> Result<Self, ConfigurationError> {
        pipeline.validate()?;
        Ok(Self {
            pipeline: pipeline.name.clone(),
            env: pipeline.env.clone(),
            steps: pipeline.local_steps().to_vec(),
        })
    }

    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The single job the gate runs
    pub fn job(&self) -> Job {
        Job::new(Environment::local(), EnvScope::new(), self.steps.clone())
    }

    /// Run the gate; the push may proceed only if the report passed
    pub async fn run<I>(
        &self,
        invoker: Arc<I>,
        events: EventBus,
        cancel: &CancellationToken,
    ) -> JobReport
    where
        I: StepInvoker,
    {
        if self.is_empty() {
            warn!(pipeline = %self.pipeline, "No local gate steps declared; allowing push");
        } else {
            info!(pipeline = %self.pipeline, steps = ?self.step_names(), "Running local gate");
        }

        let executor = JobExecutor::new(invoker, self.env.clone(), events);
        executor.run(&self.job(), cancel).await
    }
}
