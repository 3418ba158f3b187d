//! Job scheduler - decides how the jobs of a matrix share the machine
//!
//! Steps inside a job are always sequential; only whole jobs are scheduled.

use crate::{
    core::{Job, JobReport},
    execution::executor::JobExecutor,
    invoker::StepInvoker,
};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Strategy for scheduling job execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulingStrategy {
    /// Execute jobs one at a time, in declaration order
    #[default]
    Sequential,

    /// Execute all jobs at once
    Parallel,

    /// Limited parallelism (max N concurrent jobs)
    LimitedParallel(usize),
}

/// Runs a set of independent jobs under a strategy
pub struct JobScheduler {
    strategy: SchedulingStrategy,
}

impl JobScheduler {
    pub fn new(strategy: SchedulingStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> SchedulingStrategy {
        self.strategy
    }

    /// Run every job and return the reports in the order the jobs were given
    pub async fn run<I>(
        &self,
        executor: Arc<JobExecutor<I>>,
        jobs: Vec<Job>,
        cancel: &CancellationToken,
    ) -> Vec<JobReport>
    where
        I: StepInvoker + 'static,
    {
        let limit = match self.strategy {
            SchedulingStrategy::Sequential => {
                let mut reports = Vec::with_capacity(jobs.len());
                for job in &jobs {
                    reports.push(executor.run(job, cancel).await);
                }
                return reports;
            }
            SchedulingStrategy::Parallel => jobs.len().max(1),
            SchedulingStrategy::LimitedParallel(max) => max.max(1),
        };

        debug!(jobs = jobs.len(), limit, "Spawning jobs");
        let permits = Arc::new(Semaphore::new(limit));
        let mut handles = Vec::with_capacity(jobs.len());
        for job in jobs {
            let executor = executor.clone();
            let permits = permits.clone();
            let cancel = cancel.clone();
            let job_id = job.id;
            let environment = job.environment.name.clone();
            let handle = tokio::spawn(async move {
                // The semaphore is never closed, so acquiring cannot fail
                let _permit = permits.acquire_owned().await.ok();
                executor.run(&job, &cancel).await
            });
            handles.push((job_id, environment, handle));
        }

        let mut reports = Vec::with_capacity(handles.len());
        for (job_id, environment, handle) in handles {
            match handle.await {
                Ok(report) => reports.push(report),
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(err) => {
                    error!(environment = %environment, error = %err, "Job task did not complete");
                    reports.push(JobReport::aborted_before_start(job_id, environment));
                }
            }
        }
        reports
    }
}
