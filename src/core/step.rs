//! Step domain model

use crate::core::{
    config::StepConfig,
    environment::{EnvScope, Environment},
    error::ConfigurationError,
    predicate::Predicate,
};
use serde::Serialize;
use std::fmt;

/// The external tool a step hands off to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// Build from a command vector whose first element is the program
    pub fn from_command<I, S>(command: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parts = command.into_iter().map(Into::into);
        let program = parts.next()?;
        if program.is_empty() {
            return None;
        }
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// A single named validation step. Immutable once built.
#[derive(Debug, Clone)]
pub struct Step {
    pub name: String,

    pub description: Option<String>,

    pub invocation: Invocation,

    /// Overrides applied on top of the job and global scopes
    pub env: EnvScope,

    /// Inclusion gate, evaluated per environment during matrix expansion
    pub predicate: Predicate,

    /// Whether the step belongs to the pre-push local gate
    pub local: bool,

    /// Invocation timeout; `None` waits for the tool indefinitely
    pub timeout_secs: Option<u64>,
}

impl Step {
    /// Create an unconditional step running `program` with no arguments
    pub fn new(name: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            invocation: Invocation {
                program: program.into(),
                args: Vec::new(),
            },
            env: EnvScope::new(),
            predicate: Predicate::Always,
            local: false,
            timeout_secs: None,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.invocation.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key, value);
        self
    }

    pub fn when(mut self, predicate: Predicate) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn local(mut self) -> Self {
        self.local = true;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Create a step from a step config
    pub fn from_config(config: &StepConfig) -> Result<Self, ConfigurationError> {
        let invocation = Invocation::from_command(config.command.iter().cloned())
            .ok_or_else(|| ConfigurationError::EmptyCommand(config.name.clone()))?;

        let predicate = match &config.when {
            Some(when) => Predicate::from_config(&config.name, when)?,
            None => Predicate::Always,
        };

        let strict = if config.strict {
            EnvScope::strict()
        } else {
            EnvScope::new()
        };

        Ok(Step {
            name: config.name.clone(),
            description: config.description.clone(),
            invocation,
            env: strict.overlay(&EnvScope::from(config.env.clone())),
            predicate,
            local: config.local,
            timeout_secs: config.timeout_secs,
        })
    }

    /// Whether this step belongs in the job for `environment`
    pub fn applies_to(&self, environment: &Environment) -> bool {
        self.predicate.evaluate(environment)
    }
}
