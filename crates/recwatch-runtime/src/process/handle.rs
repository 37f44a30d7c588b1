//! Spawning and owning a single recorder process.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::debug;

use super::shutdown::shutdown_child;
use crate::error::ProcessError;

/// How to launch the worker: program, arguments, working directory.
#[derive(Debug, Clone)]
pub struct WorkerCommand {
    /// Executable to run.
    pub program: String,
    /// Arguments passed to the executable.
    pub args: Vec<String>,
    /// Working directory the worker runs in (it reads its config from here).
    pub workdir: PathBuf,
}

impl WorkerCommand {
    /// Create a command with no arguments, running in `workdir`.
    pub fn new(program: impl Into<String>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            workdir: workdir.into(),
        }
    }

    /// Append arguments.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

/// One spawned recorder instance.
///
/// Exists from a successful spawn until its exit is observed. Exactly one
/// of these is ever alive; the supervisor owns it and never shares it.
#[derive(Debug)]
pub struct RecorderProcess {
    child: Child,
    pid: u32,
}

impl RecorderProcess {
    /// Launch the worker with stdout and stderr piped for line reading.
    pub fn spawn(command: &WorkerCommand) -> Result<Self, ProcessError> {
        let child = Command::new(&command.program)
            .args(&command.args)
            .current_dir(&command.workdir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProcessError::SpawnFailed {
                command: command.program.clone(),
                source,
            })?;

        let pid = child.id().ok_or_else(|| ProcessError::SpawnFailed {
            command: command.program.clone(),
            source: std::io::Error::other("child exited before PID could be read"),
        })?;

        debug!(pid, program = %command.program, "worker spawned");
        Ok(Self { child, pid })
    }

    /// OS process id.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Take the stdout pipe (available once, right after spawn).
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Take the stderr pipe (available once, right after spawn).
    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.child.stderr.take()
    }

    /// Request termination, escalating to a forced kill after `grace`.
    ///
    /// Idempotent: terminating an already-exited process just reaps it.
    /// Returns the exit status and whether escalation was needed.
    pub async fn terminate(&mut self, grace: Duration) -> std::io::Result<(ExitStatus, bool)> {
        shutdown_child(&mut self.child, grace).await
    }

    /// Block until the process has fully exited.
    pub async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        self.child.wait().await
    }
}
