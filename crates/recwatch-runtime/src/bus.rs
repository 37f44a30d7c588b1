//! In-process event bus decoupling the supervisor from viewers.
//!
//! Built on `tokio::sync::broadcast`: publishing never blocks, and a
//! viewer that stops draining its queue loses the oldest buffered events
//! (the channel's lag semantics) instead of stalling lifecycle commands.
//! Dropping a receiver unsubscribes it.

use recwatch_core::WorkerEvent;
use tokio::sync::broadcast;
use tracing::trace;

/// Default per-subscriber queue depth.
const DEFAULT_CAPACITY: usize = 256;

/// Publish/subscribe channel for status and log events.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<WorkerEvent>,
}

impl EventBus {
    /// Create a bus with the given per-subscriber queue capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Deliver an event to all current subscribers. Never blocks; having
    /// no subscribers is fine.
    pub fn publish(&self, event: WorkerEvent) {
        if self.sender.receiver_count() > 0 {
            trace!(?event, "publishing event");
        }
        let _ = self.sender.send(event);
    }

    /// Register a new subscriber. Events published after this call are
    /// delivered in publish order.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<WorkerEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
