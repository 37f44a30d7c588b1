//! Worker lifecycle state and the event union streamed to viewers.
//!
//! Events are serialized with a `type` tag so the dashboard can dispatch
//! on a single discriminant:
//!
//! ```json
//! { "type": "status", "is_running": true }
//! { "type": "log", "timestamp": 1712345678901, "text": "segment saved" }
//! ```

use serde::{Deserialize, Serialize};

/// Lifecycle state of the supervised recorder worker.
///
/// Owned exclusively by the supervisor; everything else only ever sees a
/// snapshot of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// No worker process exists.
    Stopped,
    /// A start command is in flight; the process has not been spawned yet.
    Starting,
    /// The worker process is alive and its output is being drained.
    Running,
    /// A stop command is in flight; termination has been requested.
    Stopping,
    /// A restart is in flight (stop followed by start).
    Restarting,
    /// The worker exited without a stop request.
    Crashed,
}

impl WorkerState {
    /// Whether this state counts as "running" for the dashboard indicator.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}

/// Event delivered to connected viewers.
///
/// Both variants are immutable values; once published they are never
/// touched again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerEvent {
    /// The worker transitioned into or out of `Running`.
    Status {
        /// Current running indicator.
        is_running: bool,
    },

    /// One line of worker output, or a supervisor-generated notice.
    Log {
        /// Unix timestamp in milliseconds.
        timestamp: u64,
        /// The line content.
        text: String,
    },
}

impl WorkerEvent {
    /// Create a status event.
    #[must_use]
    pub const fn status(is_running: bool) -> Self {
        Self::Status { is_running }
    }

    /// Create a log event stamped with the current time.
    pub fn log(text: impl Into<String>) -> Self {
        Self::Log {
            timestamp: now_ms(),
            text: text.into(),
        }
    }
}

/// Current time as Unix milliseconds.
fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_event_serialization() {
        let event = WorkerEvent::status(true);
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"status","is_running":true}"#);
    }

    #[test]
    fn log_event_serialization() {
        let event = WorkerEvent::log("hello");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"log""#));
        assert!(json.contains(r#""text":"hello""#));
        assert!(json.contains("\"timestamp\":"));
    }

    #[test]
    fn state_serialization_is_lowercase() {
        let json = serde_json::to_string(&WorkerState::Stopped).unwrap();
        assert_eq!(json, r#""stopped""#);
    }

    #[test]
    fn only_running_counts_as_running() {
        assert!(WorkerState::Running.is_running());
        for state in [
            WorkerState::Stopped,
            WorkerState::Starting,
            WorkerState::Stopping,
            WorkerState::Restarting,
            WorkerState::Crashed,
        ] {
            assert!(!state.is_running());
        }
    }
}
