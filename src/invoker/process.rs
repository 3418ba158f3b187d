//! Subprocess invoker - runs each step as a child process

use crate::invoker::{InvocationError, InvocationOutput, InvocationRequest, StepInvoker};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Time a stopped step gets to exit after SIGTERM before its group is killed
const GRACE_PERIOD: Duration = Duration::from_secs(2);
/// How long to wait for output pipes to close once the group is gone
const OUTPUT_GRACE: Duration = Duration::from_secs(1);

/// Invoker that spawns the step's program as a subprocess
///
/// The child inherits the runner's environment with the resolved scope
/// written over it. On unix it leads its own process group, so cancellation
/// and timeouts stop everything the tool started, not just the tool itself.
#[derive(Debug, Clone, Default)]
pub struct ProcessInvoker {
    /// Directory the tools run in (the source tree under validation)
    working_dir: Option<PathBuf>,
}

impl ProcessInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn working_dir(&self) -> Option<&PathBuf> {
        self.working_dir.as_ref()
    }
}

enum Ended {
    Exited(std::io::Result<std::process::ExitStatus>),
    TimedOut,
    Cancelled,
}

#[async_trait]
impl StepInvoker for ProcessInvoker {
    async fn invoke(
        &self,
        request: &InvocationRequest,
        cancel: &CancellationToken,
    ) -> Result<InvocationOutput, InvocationError> {
        debug!(
            environment = %request.environment,
            step = %request.step,
            program = %request.program,
            args = ?request.args,
            "Spawning step process"
        );

        let mut command = Command::new(&request.program);
        command
            .args(&request.args)
            .envs(request.env.iter())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| InvocationError::Spawn {
            program: request.program.clone(),
            source,
        })?;

        // Drained concurrently; partial output survives a cut-short invocation
        let stdout = tokio::spawn(read_stream(child.stdout.take()));
        let stderr = tokio::spawn(read_stream(child.stderr.take()));

        let ended = tokio::select! {
            biased;
            _ = cancel.cancelled() => Ended::Cancelled,
            _ = expiry(request.timeout) => Ended::TimedOut,
            status = child.wait() => Ended::Exited(status),
        };

        match ended {
            Ended::Exited(status) => {
                let status = status?;
                let stdout = collect(stdout, None).await;
                let stderr = collect(stderr, None).await;
                let exit_code = status.code();
                debug!(
                    step = %request.step,
                    exit_code = ?exit_code,
                    stdout_bytes = stdout.len(),
                    stderr_bytes = stderr.len(),
                    "Step process exited"
                );
                Ok(InvocationOutput {
                    success: status.success(),
                    exit_code,
                    stdout,
                    stderr,
                })
            }
            Ended::Cancelled => {
                warn!(step = %request.step, "Step cancelled, stopping its processes");
                terminate(&mut child).await;
                Err(InvocationError::Cancelled {
                    stdout: collect(stdout, Some(OUTPUT_GRACE)).await,
                    stderr: collect(stderr, Some(OUTPUT_GRACE)).await,
                })
            }
            Ended::TimedOut => {
                let secs = request.timeout.map(|t| t.as_secs()).unwrap_or_default();
                warn!(
                    step = %request.step,
                    timeout_secs = secs,
                    "Step timed out, stopping its processes"
                );
                terminate(&mut child).await;
                Err(InvocationError::Timeout {
                    secs,
                    stdout: collect(stdout, Some(OUTPUT_GRACE)).await,
                    stderr: collect(stderr, Some(OUTPUT_GRACE)).await,
                })
            }
        }
    }
}

/// Resolves when the step's timeout elapses, never without one
async fn expiry(limit: Option<Duration>) {
    match limit {
        Some(limit) => tokio::time::sleep(limit).await,
        None => std::future::pending::<()>().await,
    }
}

async fn read_stream<R>(stream: Option<R>) -> String
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if let Some(mut stream) = stream {
        if let Err(err) = stream.read_to_end(&mut buf).await {
            warn!(error = %err, "Failed to read step output");
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Wait for a drain task, giving up after `limit` if one is set
async fn collect(mut task: JoinHandle<String>, limit: Option<Duration>) -> String {
    let joined = match limit {
        Some(limit) => match timeout(limit, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                warn!("Step output still open after its processes were stopped");
                task.abort();
                return String::new();
            }
        },
        None => task.await,
    };
    joined.unwrap_or_default()
}

/// Stop the step's whole process group: SIGTERM, a grace period, then SIGKILL
#[cfg(unix)]
async fn terminate(child: &mut Child) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return;
    };
    let group = Pid::from_raw(pid as i32);

    if let Err(err) = killpg(group, Signal::SIGTERM) {
        if err != Errno::ESRCH {
            warn!(pid, error = %err, "SIGTERM to step process group failed");
        }
    }
    if timeout(GRACE_PERIOD, child.wait()).await.is_err() {
        debug!(pid, "Step process ignored SIGTERM");
    }

    // Members that outlived the leader or ignored SIGTERM
    if let Err(err) = killpg(group, Signal::SIGKILL) {
        if err != Errno::ESRCH {
            warn!(pid, error = %err, "SIGKILL to step process group failed");
        }
    }
    if let Err(err) = child.wait().await {
        warn!(pid, error = %err, "Failed to reap step process");
    }
}

#[cfg(not(unix))]
async fn terminate(child: &mut Child) {
    if let Err(err) = child.start_kill() {
        warn!(error = %err, "Failed to kill step process");
    }
    if let Err(err) = child.wait().await {
        warn!(error = %err, "Failed to reap step process");
    }
}
