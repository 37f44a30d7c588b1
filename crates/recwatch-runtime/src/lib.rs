//! Process runtime for the recwatch supervisor.
//!
//! This crate owns the only real concurrency in the system:
//!
//! - [`process`] — spawning the recorder with piped output and shutting it
//!   down with SIGTERM → SIGKILL escalation.
//! - [`Supervisor`] — the single authority over the worker's lifecycle
//!   state machine; all start/stop/restart commands serialize here.
//! - [`EventBus`] — fan-out of status and log events to any number of
//!   viewers without ever blocking the supervisor.

pub mod bus;
pub mod error;
pub mod process;
pub mod supervisor;

pub use bus::EventBus;
pub use error::ProcessError;
pub use process::{RecorderProcess, WorkerCommand};
pub use supervisor::Supervisor;
