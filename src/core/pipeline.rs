//! Pipeline domain model

use crate::core::{
    config::PipelineConfig,
    environment::{EnvScope, Environment},
    error::ConfigurationError,
    step::Step,
};
use std::collections::HashSet;

/// One declared environment plus the overrides its job applies to every step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixEntry {
    pub environment: Environment,
    pub env: EnvScope,
}

/// A pipeline definition: ordered steps over a matrix of environments
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Pipeline name
    pub name: String,

    /// Overrides applied to every step of every job
    pub env: EnvScope,

    /// Declared environments, one job each
    pub matrix: Vec<MatrixEntry>,

    /// Steps in declaration order
    pub steps: Vec<Step>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            env: EnvScope::new(),
            matrix: Vec::new(),
            steps: Vec::new(),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key, value);
        self
    }

    pub fn with_environment(self, environment: Environment) -> Self {
        self.with_job_env(environment, EnvScope::new())
    }

    pub fn with_job_env(mut self, environment: Environment, env: EnvScope) -> Self {
        self.matrix.push(MatrixEntry { environment, env });
        self
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Create a validated pipeline from configuration
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigurationError> {
        let steps = config
            .steps
            .iter()
            .map(Step::from_config)
            .collect::<Result<Vec<_>, _>>()?;

        let matrix = config
            .environments
            .iter()
            .map(|decl| {
                let strict = if decl.strict() {
                    EnvScope::strict()
                } else {
                    EnvScope::new()
                };
                MatrixEntry {
                    environment: decl.to_environment(),
                    env: strict.overlay(&EnvScope::from(decl.env())),
                }
            })
            .collect();

        let global_strict = if config.strict {
            EnvScope::strict()
        } else {
            EnvScope::new()
        };

        let pipeline = Pipeline {
            name: config.name.clone(),
            env: global_strict.overlay(&EnvScope::from(config.env.clone())),
            matrix,
            steps,
        };
        pipeline.validate()?;
        Ok(pipeline)
    }

    /// Check the structural rules every runnable pipeline satisfies
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.steps.is_empty() {
            return Err(ConfigurationError::NoSteps(self.name.clone()));
        }
        if self.matrix.is_empty() {
            return Err(ConfigurationError::NoEnvironments(self.name.clone()));
        }

        let mut seen_steps = HashSet::new();
        for step in &self.steps {
            if !seen_steps.insert(step.name.as_str()) {
                return Err(ConfigurationError::DuplicateStep(step.name.clone()));
            }
            if step.invocation.program.is_empty() {
                return Err(ConfigurationError::EmptyCommand(step.name.clone()));
            }
        }

        let mut seen_environments = HashSet::new();
        for entry in &self.matrix {
            if !seen_environments.insert(entry.environment.name.as_str()) {
                return Err(ConfigurationError::DuplicateEnvironment(
                    entry.environment.name.clone(),
                ));
            }
        }

        self.check_local_gate()
    }

    /// Local steps must be an unconditional, strict prefix of the step list
    fn check_local_gate(&self) -> Result<(), ConfigurationError> {
        let prefix = self.local_steps();

        for step in prefix {
            if !step.predicate.is_always() {
                return Err(ConfigurationError::LocalGateConditional(step.name.clone()));
            }
        }

        if let Some(stray) = self.steps[prefix.len()..].iter().find(|s| s.local) {
            return Err(ConfigurationError::LocalGateNotPrefix(stray.name.clone()));
        }

        if !prefix.is_empty() && prefix.len() == self.steps.len() {
            return Err(ConfigurationError::LocalGateNotStrict(self.name.clone()));
        }

        Ok(())
    }

    /// Get a step by name
    pub fn step(&self, name: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.name == name)
    }

    pub fn environments(&self) -> impl Iterator<Item = &Environment> {
        self.matrix.iter().map(|entry| &entry.environment)
    }

    /// The leading run of steps marked for the local gate
    pub fn local_steps(&self) -> &[Step] {
        let len = self.steps.iter().take_while(|s| s.local).count();
        &self.steps[..len]
    }

    /// Narrow the matrix to the named environments, keeping declaration order
    pub fn restrict_to(mut self, names: &[String]) -> Result<Self, ConfigurationError> {
        if names.is_empty() {
            return Ok(self);
        }
        if let Some(unknown) = names
            .iter()
            .find(|name| !self.environments().any(|env| &env.name == *name))
        {
            return Err(ConfigurationError::UnknownEnvironment(unknown.clone()));
        }
        self.matrix
            .retain(|entry| names.contains(&entry.environment.name));
        Ok(self)
    }
}
