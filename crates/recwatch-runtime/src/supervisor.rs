//! Single authority over the worker lifecycle.
//!
//! All lifecycle-changing commands serialize on one `tokio::sync::Mutex`
//! that also owns the active process handle, so the state machine and the
//! handle's lifetime always change together. A command arriving while
//! another is in flight gets [`ProcessError::Busy`] instead of queueing.
//!
//! State machine:
//!
//! ```text
//! Stopped --start--> Starting --(spawn ok)--> Running
//! Starting --(spawn fails)--> Stopped
//! Running --stop--> Stopping --(exited)--> Stopped
//! Running --(unexpected exit)--> Crashed --(auto)--> Stopped
//! Running|Stopped --(config saved while running)--> Restarting --> Running|Stopped
//! ```

use std::sync::{Arc, RwLock};
use std::time::Duration;

use recwatch_core::{ConfigStore, WorkerEvent, WorkerState};
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::bus::EventBus;
use crate::error::ProcessError;
use crate::process::{RecorderProcess, WorkerCommand, drain_lines};

/// Supervisor for the single recorder worker.
///
/// Wrap in `Arc` for shared access; lifecycle commands take
/// `self: &Arc<Self>` because they spawn drain tasks that outlive the
/// call.
#[derive(Debug)]
pub struct Supervisor {
    command: WorkerCommand,
    grace: Duration,
    store: Arc<ConfigStore>,
    bus: EventBus,
    /// Snapshot state for non-blocking `status()` reads.
    state: RwLock<WorkerState>,
    /// Command serialization point; owns the zero-or-one active process.
    slot: Mutex<Option<RecorderProcess>>,
}

impl Supervisor {
    /// Create a supervisor. No process is spawned until [`Self::start`].
    #[must_use]
    pub fn new(
        command: WorkerCommand,
        grace: Duration,
        store: Arc<ConfigStore>,
        bus: EventBus,
    ) -> Self {
        Self {
            command,
            grace,
            store,
            bus,
            state: RwLock::new(WorkerState::Stopped),
            slot: Mutex::new(None),
        }
    }

    /// Non-blocking snapshot of the current lifecycle state.
    #[must_use]
    pub fn status(&self) -> WorkerState {
        *self.state.read().unwrap()
    }

    /// The event bus carrying this supervisor's status and log events.
    #[must_use]
    pub const fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Register a viewer: returns the synthetic status event that must be
    /// delivered first, plus the live subscription.
    #[must_use]
    pub fn subscribe(&self) -> (WorkerEvent, broadcast::Receiver<WorkerEvent>) {
        let rx = self.bus.subscribe();
        (WorkerEvent::status(self.status().is_running()), rx)
    }

    /// Start the worker.
    ///
    /// No-op returning `Ok` when a process is already active. Publishes
    /// `status {true}` and a "started" log line on success, an error log
    /// line on spawn failure.
    pub async fn start(self: &Arc<Self>) -> Result<(), ProcessError> {
        let mut slot = self.slot.try_lock().map_err(|_| ProcessError::Busy)?;
        if slot.is_some() {
            debug!("start ignored: worker already active");
            return Ok(());
        }

        match self.spawn_locked(&mut slot, false) {
            Ok(pid) => {
                info!(pid, "recorder started");
                Ok(())
            }
            Err(e) => {
                self.bus
                    .publish(WorkerEvent::log(format!("failed to start recorder: {e}")));
                self.bus.publish(WorkerEvent::status(false));
                Err(e)
            }
        }
    }

    /// Stop the worker with a bounded grace period.
    ///
    /// No-op returning `Ok` when already stopped. Publishes
    /// `status {false}` and a "stopped" log line.
    pub async fn stop(self: &Arc<Self>) -> Result<(), ProcessError> {
        let mut slot = self.slot.try_lock().map_err(|_| ProcessError::Busy)?;
        if slot.is_none() {
            debug!("stop ignored: worker not active");
            return Ok(());
        }

        self.shutdown_locked(&mut slot, false).await;
        self.bus.publish(WorkerEvent::log("recorder stopped"));
        info!("recorder stopped");
        Ok(())
    }

    /// Stop, then start with a freshly-read configuration snapshot.
    ///
    /// Used when configuration is saved while the worker runs. A second
    /// restart (or any other command) while one is in flight is rejected
    /// as [`ProcessError::Busy`].
    pub async fn restart(self: &Arc<Self>) -> Result<(), ProcessError> {
        let mut slot = self.slot.try_lock().map_err(|_| ProcessError::Busy)?;

        self.bus.publish(WorkerEvent::log("restarting recorder"));
        self.set_state(WorkerState::Restarting);

        if slot.is_some() {
            self.shutdown_locked(&mut slot, true).await;
        }

        match self.spawn_locked(&mut slot, true) {
            Ok(pid) => {
                info!(pid, "recorder restarted");
                Ok(())
            }
            Err(e) => {
                self.bus
                    .publish(WorkerEvent::log(format!("recorder restart failed: {e}")));
                warn!(error = %e, "restart failed; worker left stopped");
                Err(e)
            }
        }
    }

    /// Watch the config store and restart the worker when configuration
    /// changes while it is running. Changes while stopped are picked up
    /// by the next start, which always reads a fresh snapshot.
    pub fn watch_config_changes(self: &Arc<Self>) -> JoinHandle<()> {
        let sup = Arc::clone(self);
        let mut rx = self.store.subscribe_changes();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                if !sup.status().is_running() {
                    debug!("configuration changed while worker stopped; no restart");
                    continue;
                }
                info!("configuration changed; restarting worker");
                if let Err(e) = sup.restart().await {
                    warn!(error = %e, "restart after config change failed");
                }
            }
        })
    }

    /// Spawn the worker and wire up its drain loop. Caller holds the slot
    /// lock with an empty slot.
    ///
    /// Publishes `status {true}` and the outcome log line on success.
    /// During a restart the transitional `Starting` write is skipped so
    /// `status()` keeps reporting `Restarting` until the outcome is
    /// known.
    fn spawn_locked(
        self: &Arc<Self>,
        slot: &mut Option<RecorderProcess>,
        mid_restart: bool,
    ) -> Result<u32, ProcessError> {
        if !mid_restart {
            self.set_state(WorkerState::Starting);
        }

        // Snapshot must be readable before anything is spawned; the worker
        // itself re-reads the files from its working directory.
        let snapshot = match self.store.read() {
            Ok(bundle) => bundle,
            Err(e) => {
                self.set_state(WorkerState::Stopped);
                return Err(e.into());
            }
        };
        let urls = snapshot
            .url_config
            .content
            .lines()
            .filter(|l| {
                let l = l.trim();
                !l.is_empty() && !l.starts_with('#')
            })
            .count();
        debug!(urls, "configuration snapshot read before spawn");

        let mut proc = match RecorderProcess::spawn(&self.command) {
            Ok(proc) => proc,
            Err(e) => {
                self.set_state(WorkerState::Stopped);
                return Err(e);
            }
        };

        let pid = proc.pid();
        let stdout = proc.take_stdout();
        let stderr = proc.take_stderr();
        *slot = Some(proc);
        self.set_state(WorkerState::Running);
        self.bus.publish(WorkerEvent::status(true));

        // The outcome log goes out before the drain loop starts so worker
        // output can never be interleaved ahead of it
        if mid_restart {
            self.bus.publish(WorkerEvent::log("recorder restarted"));
        } else {
            self.bus
                .publish(WorkerEvent::log(format!("recorder started (PID {pid})")));
        }

        let sup = Arc::clone(self);
        tokio::spawn(async move {
            match (stdout, stderr) {
                (Some(out), Some(err)) => {
                    tokio::join!(
                        drain_lines(out, sup.bus.clone()),
                        drain_lines(err, sup.bus.clone())
                    );
                }
                (Some(out), None) => drain_lines(out, sup.bus.clone()).await,
                (None, Some(err)) => drain_lines(err, sup.bus.clone()).await,
                (None, None) => {}
            }
            sup.reconcile_exit(pid).await;
        });

        Ok(pid)
    }

    /// Terminate the active process. Caller holds the slot lock with a
    /// non-empty slot.
    ///
    /// Publishes `status {false}`. Always leaves the slot empty; a
    /// termination error is logged and the handle dropped (`kill_on_drop`
    /// backstops the kill).
    async fn shutdown_locked(&self, slot: &mut Option<RecorderProcess>, mid_restart: bool) {
        let Some(mut proc) = slot.take() else {
            return;
        };

        if !mid_restart {
            self.set_state(WorkerState::Stopping);
        }

        match proc.terminate(self.grace).await {
            Ok((status, escalated)) => {
                if escalated {
                    self.bus.publish(WorkerEvent::log(format!(
                        "recorder did not exit within {}s, killed",
                        self.grace.as_secs()
                    )));
                    warn!(grace_secs = self.grace.as_secs(), "termination escalated to SIGKILL");
                } else {
                    debug!(?status, "worker exited within grace period");
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to terminate worker cleanly, dropping handle");
            }
        }

        if !mid_restart {
            self.set_state(WorkerState::Stopped);
        }
        self.bus.publish(WorkerEvent::status(false));
    }

    /// Called by the drain task once the worker's output closes.
    ///
    /// If the exiting pid is still the active one, no stop was requested:
    /// this is an unexpected exit. Otherwise a stop/restart already owns
    /// the handle and nothing is left to do.
    async fn reconcile_exit(&self, pid: u32) {
        let mut slot = self.slot.lock().await;
        let still_active = slot.as_ref().is_some_and(|p| p.pid() == pid);
        if !still_active {
            return;
        }

        self.set_state(WorkerState::Crashed);
        let Some(mut proc) = slot.take() else {
            return;
        };
        let detail = match proc.wait().await {
            Ok(status) => status.to_string(),
            Err(e) => format!("wait failed: {e}"),
        };
        warn!(pid, %detail, "recorder exited unexpectedly");

        self.bus.publish(WorkerEvent::log(format!(
            "recorder exited unexpectedly ({detail})"
        )));
        self.bus.publish(WorkerEvent::status(false));
        self.set_state(WorkerState::Stopped);
    }

    fn set_state(&self, next: WorkerState) {
        *self.state.write().unwrap() = next;
    }
}
