//! Error taxonomy for lifecycle operations.
//!
//! Every variant here is a local, recoverable condition: the supervisor
//! reports it outward (as a command result and usually a log event) and
//! stays ready for the next command.

use recwatch_core::ConfigError;
use thiserror::Error;

/// Errors from supervisor lifecycle commands and process operations.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The worker executable could not be spawned.
    #[error("failed to spawn worker `{command}`: {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Another lifecycle command is already in flight.
    #[error("another lifecycle command is in progress")]
    Busy,

    /// Signalling or reaping the worker process failed.
    #[error("failed to terminate worker: {0}")]
    TerminateFailed(#[from] std::io::Error),

    /// The configuration snapshot could not be read before spawning.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
