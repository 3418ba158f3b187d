//! qgate - a quality-gate pipeline runner with a pre-push local gate

pub mod cli;
pub mod core;
pub mod execution;
pub mod invoker;

// Re-export commonly used types
pub use crate::core::{
    ConfigurationError, EnvScope, Environment, Job, JobReport, JobState, Pipeline, PipelineError,
    Predicate, RunVerdict, Step, Verdict,
};
pub use execution::{ExecutionEngine, ExecutionEvent, LocalGate, MatrixExpander, SchedulingStrategy};
pub use invoker::{InvocationOutput, InvocationRequest, ProcessInvoker, StepInvoker};
