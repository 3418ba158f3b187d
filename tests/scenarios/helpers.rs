//! Test utilities for qgate scenarios

#![allow(dead_code)]

use async_trait::async_trait;
use qgate::core::config::PipelineConfig;
use qgate::core::{EnvScope, Pipeline, RunVerdict};
use qgate::execution::{ExecutionEngine, SchedulingStrategy};
use qgate::invoker::{InvocationError, InvocationOutput, InvocationRequest, StepInvoker};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// One recorded invocation
#[derive(Debug, Clone)]
pub struct Call {
    pub environment: String,
    pub step: String,
    pub env: EnvScope,
}

/// Mock invoker with scripted failures
///
/// Every step passes unless scripted otherwise. Failures can be scoped to
/// one environment or apply everywhere.
#[derive(Default)]
pub struct MockInvoker {
    /// (environment or `None` for all, step) -> exit code
    failures: HashMap<(Option<String>, String), i32>,
    /// Step that blocks until the run is cancelled
    hang_on: Option<String>,
    /// Step that cancels the run when it starts, then blocks
    cancel_on: Option<(String, CancellationToken)>,
    delay: Option<Duration>,
    calls: Mutex<Vec<Call>>,
}

impl MockInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail `step` in every environment
    pub fn failing(mut self, step: &str, exit_code: i32) -> Self {
        self.failures.insert((None, step.to_string()), exit_code);
        self
    }

    /// Fail `step` only in `environment`
    pub fn failing_in(mut self, environment: &str, step: &str, exit_code: i32) -> Self {
        self.failures
            .insert((Some(environment.to_string()), step.to_string()), exit_code);
        self
    }

    pub fn hanging_on(mut self, step: &str) -> Self {
        self.hang_on = Some(step.to_string());
        self
    }

    pub fn cancelling_on(mut self, step: &str, token: CancellationToken) -> Self {
        self.cancel_on = Some((step.to_string(), token));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Steps invoked in `environment`, in order
    pub fn invoked_in(&self, environment: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.environment == environment)
            .map(|c| c.step)
            .collect()
    }

    pub fn count(&self, step: &str) -> usize {
        self.calls().iter().filter(|c| c.step == step).count()
    }

    fn scripted_failure(&self, request: &InvocationRequest) -> Option<i32> {
        self.failures
            .get(&(Some(request.environment.clone()), request.step.clone()))
            .or_else(|| self.failures.get(&(None, request.step.clone())))
            .copied()
    }
}

#[async_trait]
impl StepInvoker for MockInvoker {
    async fn invoke(
        &self,
        request: &InvocationRequest,
        cancel: &CancellationToken,
    ) -> Result<InvocationOutput, InvocationError> {
        self.calls.lock().unwrap().push(Call {
            environment: request.environment.clone(),
            step: request.step.clone(),
            env: request.env.clone(),
        });

        if let Some((step, token)) = &self.cancel_on {
            if step == &request.step {
                token.cancel();
            }
        }
        let blocks = self.hang_on.as_deref() == Some(request.step.as_str())
            || self.cancel_on.as_ref().is_some_and(|(s, _)| s == &request.step);
        if blocks {
            cancel.cancelled().await;
            return Err(InvocationError::cancelled());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.scripted_failure(request) {
            Some(code) => Ok(InvocationOutput::failed(
                code,
                format!("{} failed on {}", request.step, request.environment),
            )),
            None => Ok(InvocationOutput::passed(format!("{} ok", request.step))),
        }
    }
}

/// The six-step pipeline over three operating systems
pub const SCENARIO: &str = r#"
name: scenario
environments: [linux, macos, windows]
steps:
  - name: format
    command: [cargo, fmt, --all, --, --check]
    local: true
  - name: lint
    command: [cargo, clippy, --all-targets]
    strict: true
    local: true
  - name: doc
    command: [cargo, doc, --no-deps]
    strict: true
    local: true
  - name: build
    command: [cargo, build]
  - name: test
    command: [cargo, test]
  - name: leak-sanitizer
    command: [cargo, +nightly, test]
    env:
      RUSTFLAGS: "-Z sanitizer=leak"
    when:
      attribute: os
      equals: linux
"#;

pub fn pipeline_from_yaml(yaml: &str) -> Pipeline {
    PipelineConfig::from_yaml(yaml)
        .expect("valid pipeline definition")
        .to_pipeline()
        .expect("valid pipeline")
}

pub fn scenario_pipeline() -> Pipeline {
    pipeline_from_yaml(SCENARIO)
}

/// Run a pipeline with a mock invoker and return the verdict
pub async fn run_with_mock(
    pipeline: &Pipeline,
    invoker: Arc<MockInvoker>,
    strategy: SchedulingStrategy,
) -> RunVerdict {
    let engine = ExecutionEngine::with_invoker(invoker, strategy);
    engine
        .execute(pipeline, &CancellationToken::new())
        .await
        .expect("pipeline runs")
}

pub fn strategies() -> [SchedulingStrategy; 3] {
    [
        SchedulingStrategy::Sequential,
        SchedulingStrategy::Parallel,
        SchedulingStrategy::LimitedParallel(2),
    ]
}
