//! Main execution engine - orchestrates the entire pipeline run

use crate::{
    core::{ConfigurationError, Pipeline, RunVerdict},
    execution::{
        events::{EventBus, ExecutionEvent},
        executor::JobExecutor,
        matrix::MatrixExpander,
        scheduler::{JobScheduler, SchedulingStrategy},
    },
    invoker::StepInvoker,
};
use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// Main pipeline execution engine
pub struct ExecutionEngine<I> {
    invoker: Arc<I>,
    scheduler: JobScheduler,
    events: EventBus,
}

impl<I: StepInvoker + 'static> ExecutionEngine<I> {
    pub fn new(invoker: I, strategy: SchedulingStrategy) -> Self {
        Self::with_invoker(Arc::new(invoker), strategy)
    }

    /// Share an invoker that the caller keeps a handle to
    pub fn with_invoker(invoker: Arc<I>, strategy: SchedulingStrategy) -> Self {
        Self {
            invoker,
            scheduler: JobScheduler::new(strategy),
            events: EventBus::new(),
        }
    }

    /// Add an event handler
    pub async fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(handler).await;
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Execute the entire pipeline
    ///
    /// A malformed pipeline is rejected before any job starts. Step failures
    /// and cancellation end up in the returned verdict, never in the error.
    pub async fn execute(
        &self,
        pipeline: &Pipeline,
        cancel: &CancellationToken,
    ) -> Result<RunVerdict, ConfigurationError> {
        let jobs = MatrixExpander::expand(pipeline)?;

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(
            run_id = %run_id,
            pipeline = %pipeline.name,
            jobs = jobs.len(),
            strategy = ?self.scheduler.strategy(),
            "Starting pipeline run"
        );
        self.events
            .emit(ExecutionEvent::RunStarted {
                run_id,
                pipeline: pipeline.name.clone(),
                jobs: jobs.iter().map(|j| j.environment.name.clone()).collect(),
            })
            .await;

        let executor = Arc::new(JobExecutor::new(
            self.invoker.clone(),
            pipeline.env.clone(),
            self.events.clone(),
        ));
        let reports = self.scheduler.run(executor, jobs, cancel).await;

        let verdict = RunVerdict::new(run_id, pipeline.name.clone(), reports, started_at);
        if verdict.passed() {
            info!(run_id = %run_id, pipeline = %pipeline.name, "Pipeline passed");
        } else {
            for failure in verdict.failures() {
                warn!(run_id = %run_id, "{}", failure);
            }
        }
        self.events
            .emit(ExecutionEvent::RunFinished {
                run_id,
                verdict: verdict.verdict,
            })
            .await;

        Ok(verdict)
    }
}
