//! Error types for pipeline definitions and runs

use thiserror::Error;

/// A malformed pipeline definition. Always surfaces before any job starts.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("failed to read pipeline definition {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse pipeline definition: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("pipeline '{0}' declares no steps")]
    NoSteps(String),

    #[error("pipeline '{0}' declares no environments")]
    NoEnvironments(String),

    #[error("duplicate step name: {0}")]
    DuplicateStep(String),

    #[error("duplicate environment name: {0}")]
    DuplicateEnvironment(String),

    #[error("unknown environment: {0}")]
    UnknownEnvironment(String),

    #[error("step '{0}' has an empty command")]
    EmptyCommand(String),

    #[error("step '{step}' has a malformed predicate: {reason}")]
    MalformedPredicate { step: String, reason: String },

    #[error("local gate step '{0}' must directly follow the other local gate steps at the start of the pipeline")]
    LocalGateNotPrefix(String),

    #[error("local gate step '{0}' must not carry an environment predicate")]
    LocalGateConditional(String),

    #[error("local gate covers every step of pipeline '{0}'; it must be a strict prefix")]
    LocalGateNotStrict(String),
}

/// Why a pipeline run did not pass.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("step '{step}' failed in environment '{environment}' (exit code {})", exit_code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    StepFailure {
        environment: String,
        step: String,
        exit_code: Option<i32>,
    },

    #[error("job for environment '{environment}' was aborted{}", step.as_ref().map(|s| format!(" during step '{}'", s)).unwrap_or_default())]
    JobAborted {
        environment: String,
        step: Option<String>,
    },
}
