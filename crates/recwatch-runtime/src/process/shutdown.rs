//! Graceful shutdown for `tokio::process::Child` with SIGTERM → SIGKILL
//! escalation.
//!
//! The grace period is a hard timeout: once it expires the process is
//! killed unconditionally and then reaped (reaping is required to avoid
//! zombies).

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tokio::time::timeout;

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// Shut down a child process, preferring a cooperative exit.
///
/// 1. Send SIGTERM and wait up to `grace` for the process to exit.
/// 2. If still running, send SIGKILL.
/// 3. Wait for reaping.
///
/// Returns the exit status and `true` if escalation to SIGKILL happened.
/// On non-Unix platforms there is no cooperative phase; the process is
/// killed immediately.
pub async fn shutdown_child(child: &mut Child, grace: Duration) -> io::Result<(ExitStatus, bool)> {
    #[cfg(unix)]
    {
        shutdown_unix(child, grace).await
    }

    #[cfg(not(unix))]
    {
        let _ = grace;
        child.kill().await?;
        Ok((child.wait().await?, true))
    }
}

#[cfg(unix)]
async fn shutdown_unix(child: &mut Child, grace: Duration) -> io::Result<(ExitStatus, bool)> {
    let Some(pid) = child.id() else {
        // Already exited and reaped by a previous wait
        return Ok((child.wait().await?, false));
    };

    if let Err(e) = signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        // ESRCH: the process exited between the id() read and the signal
        if e == nix::errno::Errno::ESRCH {
            return Ok((child.wait().await?, false));
        }
        return Err(io::Error::other(e));
    }

    if let Ok(result) = timeout(grace, child.wait()).await {
        return Ok((result?, false));
    }

    // Grace period expired: force kill, then reap
    child.kill().await?;
    Ok((child.wait().await?, true))
}
