//! Invocation result types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for step invocation
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The step ran past its timeout; carries what it wrote until then
    #[error("timed out after {secs} seconds")]
    Timeout {
        secs: u64,
        stdout: String,
        stderr: String,
    },

    /// The run was cancelled while the step was in flight
    #[error("cancelled")]
    Cancelled { stdout: String, stderr: String },

    #[error("i/o error while waiting for the step: {0}")]
    Io(#[from] std::io::Error),
}

impl InvocationError {
    /// A cancellation that captured no output
    pub fn cancelled() -> Self {
        InvocationError::Cancelled {
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// Output captured before the invocation was cut short, as (stdout, stderr)
    pub fn partial_output(&self) -> (&str, &str) {
        match self {
            InvocationError::Timeout { stdout, stderr, .. }
            | InvocationError::Cancelled { stdout, stderr } => (stdout, stderr),
            _ => ("", ""),
        }
    }
}

/// Termination status and captured output of one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationOutput {
    /// Whether the tool reported success
    pub success: bool,

    /// Exit code, if the tool exited normally
    pub exit_code: Option<i32>,

    pub stdout: String,

    pub stderr: String,
}

impl InvocationOutput {
    /// A successful termination with exit code 0
    pub fn passed(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// An unsuccessful termination with the given exit code
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}
