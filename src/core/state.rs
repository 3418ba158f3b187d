//! Execution state models

use crate::core::error::PipelineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Process exit code for a failed run or rejected push
pub const EXIT_FAILURE: i32 = 1;
/// Process exit code for a malformed pipeline definition
pub const EXIT_CONFIGURATION: i32 = 2;
/// Process exit code for an externally cancelled run
pub const EXIT_ABORTED: i32 = 130;

/// How a single step ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Passed,
    Failed,
    /// Interrupted by cancellation before the tool returned
    Aborted,
}

/// What one step invocation did, kept even when it failed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub name: String,
    pub command: String,
    pub outcome: StepOutcome,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl StepRecord {
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    /// Captured stdout followed by stderr
    pub fn output(&self) -> String {
        match (self.stdout.trim_end().is_empty(), self.stderr.trim_end().is_empty()) {
            (true, true) => String::new(),
            (false, true) => self.stdout.trim_end().to_string(),
            (true, false) => self.stderr.trim_end().to_string(),
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr.trim_end()),
        }
    }
}

/// How a job ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobState {
    /// Every step passed
    Passed,
    /// `step` failed; later steps never ran
    Failed { step: String },
    /// Cancelled externally, during `step` if one was in flight
    Aborted { step: Option<String> },
}

/// Terminal report of one job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub job_id: Uuid,
    pub environment: String,
    pub state: JobState,
    /// Records of the steps that were invoked, in order
    pub steps: Vec<StepRecord>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl JobReport {
    /// Report for a job that was cut off before any step ran
    pub fn aborted_before_start(job_id: Uuid, environment: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            job_id,
            environment: environment.into(),
            state: JobState::Aborted { step: None },
            steps: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    pub fn passed(&self) -> bool {
        self.state == JobState::Passed
    }

    pub fn aborted(&self) -> bool {
        matches!(self.state, JobState::Aborted { .. })
    }

    /// The record of the step that ended the job early
    pub fn failing_step(&self) -> Option<&StepRecord> {
        match &self.state {
            JobState::Failed { step } | JobState::Aborted { step: Some(step) } => {
                self.steps.iter().rev().find(|r| &r.name == step)
            }
            _ => None,
        }
    }

    pub fn invoked_steps(&self) -> Vec<&str> {
        self.steps.iter().map(|r| r.name.as_str()).collect()
    }

    /// Describe a non-passing job as an error
    pub fn error(&self) -> Option<PipelineError> {
        match &self.state {
            JobState::Failed { step } => Some(PipelineError::StepFailure {
                environment: self.environment.clone(),
                step: step.clone(),
                exit_code: self.failing_step().and_then(|r| r.exit_code),
            }),
            JobState::Aborted { step } => Some(PipelineError::JobAborted {
                environment: self.environment.clone(),
                step: step.clone(),
            }),
            _ => None,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.state {
            JobState::Passed => 0,
            JobState::Aborted { .. } => EXIT_ABORTED,
            _ => EXIT_FAILURE,
        }
    }
}

/// Aggregate pass/fail result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
}

/// Outcome of a whole pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunVerdict {
    pub run_id: Uuid,
    pub pipeline: String,
    pub verdict: Verdict,
    /// Job reports in environment declaration order
    pub jobs: Vec<JobReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunVerdict {
    pub fn new(
        run_id: Uuid,
        pipeline: impl Into<String>,
        jobs: Vec<JobReport>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let verdict = if jobs.iter().all(JobReport::passed) {
            Verdict::Pass
        } else {
            Verdict::Fail
        };
        Self {
            run_id,
            pipeline: pipeline.into(),
            verdict,
            jobs,
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }

    /// Whether any job was cut short by cancellation
    pub fn aborted(&self) -> bool {
        self.jobs.iter().any(JobReport::aborted)
    }

    pub fn job(&self, environment: &str) -> Option<&JobReport> {
        self.jobs.iter().find(|j| j.environment == environment)
    }

    /// One error per job that did not pass
    pub fn failures(&self) -> Vec<PipelineError> {
        self.jobs.iter().filter_map(JobReport::error).collect()
    }

    pub fn exit_code(&self) -> i32 {
        if self.passed() {
            0
        } else if self.aborted() {
            EXIT_ABORTED
        } else {
            EXIT_FAILURE
        }
    }
}
