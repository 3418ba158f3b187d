//! Job executor - runs one job's steps in order, stopping at the first failure

use crate::{
    core::{EnvScope, Job, JobReport, JobState, Step, StepOutcome, StepRecord},
    execution::events::{EventBus, ExecutionEvent},
    invoker::{InvocationError, InvocationRequest, StepInvoker},
};
use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Passing steps log at most this many trailing bytes of their output
const LOGGED_OUTPUT_LIMIT: usize = 2048;

/// Executes the steps of a job against an invoker
pub struct JobExecutor<I> {
    invoker: Arc<I>,
    /// Pipeline-wide scope, the lowest layer of every step's environment
    global_env: EnvScope,
    events: EventBus,
}

impl<I: StepInvoker> JobExecutor<I> {
    pub fn new(invoker: Arc<I>, global_env: EnvScope, events: EventBus) -> Self {
        Self {
            invoker,
            global_env,
            events,
        }
    }

    /// Run `job` to completion, first failure, or cancellation
    pub async fn run(&self, job: &Job, cancel: &CancellationToken) -> JobReport {
        let environment = job.environment.name.clone();
        let started_at = Utc::now();
        let mut records = Vec::with_capacity(job.steps.len());

        info!(
            environment = %environment,
            steps = job.steps.len(),
            "Starting job"
        );
        self.events
            .emit(ExecutionEvent::JobStarted {
                environment: environment.clone(),
                steps: job.step_names().into_iter().map(String::from).collect(),
            })
            .await;

        let mut state = JobState::Passed;
        for step in &job.steps {
            if cancel.is_cancelled() {
                warn!(environment = %environment, step = %step.name, "Job cancelled before step");
                state = JobState::Aborted { step: None };
                break;
            }

            let env = job.effective_env(&self.global_env, step);
            let record = self.run_step(&environment, step, env, cancel).await;
            let outcome = record.outcome;
            records.push(record);

            match outcome {
                StepOutcome::Passed => {}
                StepOutcome::Failed => {
                    state = JobState::Failed {
                        step: step.name.clone(),
                    };
                    break;
                }
                StepOutcome::Aborted => {
                    state = JobState::Aborted {
                        step: Some(step.name.clone()),
                    };
                    break;
                }
            }
        }

        match &state {
            JobState::Passed => info!(environment = %environment, "Job passed"),
            other => warn!(environment = %environment, state = ?other, "Job did not pass"),
        }
        self.events
            .emit(ExecutionEvent::JobFinished {
                environment: environment.clone(),
                state: state.clone(),
            })
            .await;

        JobReport {
            job_id: job.id,
            environment,
            state,
            steps: records,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Invoke a single step with its resolved scope and record what happened
    async fn run_step(
        &self,
        environment: &str,
        step: &Step,
        env: EnvScope,
        cancel: &CancellationToken,
    ) -> StepRecord {
        let command = step.invocation.to_string();
        debug!(environment, step = %step.name, env = ?env, "Resolved step scope");
        self.events
            .emit(ExecutionEvent::StepStarted {
                environment: environment.to_string(),
                step: step.name.clone(),
                command: command.clone(),
            })
            .await;

        let started_at = Utc::now();
        let request = InvocationRequest::new(environment, step, env);
        let result = self.invoker.invoke(&request, cancel).await;

        let (outcome, exit_code, stdout, stderr) = match result {
            Ok(output) if output.success => {
                (StepOutcome::Passed, output.exit_code, output.stdout, output.stderr)
            }
            Ok(output) => (StepOutcome::Failed, output.exit_code, output.stdout, output.stderr),
            Err(InvocationError::Cancelled { stdout, stderr }) => {
                (StepOutcome::Aborted, None, stdout, stderr)
            }
            Err(err) => {
                let (stdout, stderr) = err.partial_output();
                let stderr = match stderr.trim_end() {
                    "" => err.to_string(),
                    partial => format!("{}\n{}", partial, err),
                };
                (StepOutcome::Failed, None, stdout.to_string(), stderr)
            }
        };

        let record = StepRecord {
            name: step.name.clone(),
            command,
            outcome,
            exit_code,
            stdout,
            stderr,
            started_at,
            finished_at: Utc::now(),
        };

        match record.outcome {
            StepOutcome::Passed => {
                let output = record.output();
                info!(
                    environment,
                    step = %record.name,
                    outcome = ?record.outcome,
                    exit_code = ?record.exit_code,
                    duration_ms = record.duration_ms(),
                    output = %output_tail(&output, LOGGED_OUTPUT_LIMIT),
                    "Step finished"
                );
            }
            _ => warn!(
                environment,
                step = %record.name,
                outcome = ?record.outcome,
                exit_code = ?record.exit_code,
                duration_ms = record.duration_ms(),
                output = %record.output(),
                "Step did not pass"
            ),
        }

        self.events
            .emit(ExecutionEvent::StepFinished {
                environment: environment.to_string(),
                record: record.clone(),
            })
            .await;

        record
    }
}

/// The last `limit` bytes of `output`, cut on a char boundary
fn output_tail(output: &str, limit: usize) -> &str {
    if output.len() <= limit {
        return output;
    }
    let mut start = output.len() - limit;
    while !output.is_char_boundary(start) {
        start += 1;
    }
    &output[start..]
}
