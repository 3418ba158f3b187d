//! Step invocation boundary
//!
//! The orchestrator hands each step a program, its arguments and the
//! resolved environment scope, and gets back a termination status plus the
//! captured output. Anything implementing [`StepInvoker`] can sit behind it.

pub mod process;
pub mod response;

use crate::core::{EnvScope, Step};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub use process::ProcessInvoker;
pub use response::{InvocationError, InvocationOutput};

/// Everything an invoker needs to run one step
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    /// Environment of the job the step belongs to
    pub environment: String,
    pub step: String,
    pub program: String,
    pub args: Vec<String>,
    /// Fully resolved scope (global, job and step layers merged)
    pub env: EnvScope,
    pub timeout: Option<Duration>,
}

impl InvocationRequest {
    pub fn new(environment: impl Into<String>, step: &Step, env: EnvScope) -> Self {
        Self {
            environment: environment.into(),
            step: step.name.clone(),
            program: step.invocation.program.clone(),
            args: step.invocation.args.clone(),
            env,
            timeout: step.timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Trait for step invocation - allows for different implementations
#[async_trait]
pub trait StepInvoker: Send + Sync {
    /// Run the request to completion
    ///
    /// Blocks until the tool terminates. Once `cancel` fires the in-flight
    /// tool is stopped and `InvocationError::Cancelled` is returned with
    /// whatever output it produced.
    async fn invoke(
        &self,
        request: &InvocationRequest,
        cancel: &CancellationToken,
    ) -> Result<InvocationOutput, InvocationError>;
}

#[async_trait]
impl<T: StepInvoker + ?Sized> StepInvoker for Arc<T> {
    async fn invoke(
        &self,
        request: &InvocationRequest,
        cancel: &CancellationToken,
    ) -> Result<InvocationOutput, InvocationError> {
        (**self).invoke(request, cancel).await
    }
}
