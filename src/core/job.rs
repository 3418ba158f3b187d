//! Job domain model - one environment's ordered run of applicable steps

use crate::core::{
    environment::{EnvScope, Environment},
    step::Step,
};
use uuid::Uuid;

/// A job produced by matrix expansion. Consumed by a single run.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,

    pub environment: Environment,

    /// Overrides applied to every step of this job
    pub env: EnvScope,

    /// Applicable steps in declaration order
    pub steps: Vec<Step>,
}

impl Job {
    pub fn new(environment: Environment, env: EnvScope, steps: Vec<Step>) -> Self {
        Self {
            id: Uuid::new_v4(),
            environment,
            env,
            steps,
        }
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    /// Resolve the scope `step` runs with: global, then job, then step
    pub fn effective_env(&self, global: &EnvScope, step: &Step) -> EnvScope {
        EnvScope::resolve([global, &self.env, &step.env])
    }
}
