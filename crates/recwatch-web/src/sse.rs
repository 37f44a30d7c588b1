//! Per-viewer SSE stream over the supervisor's event bus.
//!
//! Every connecting viewer first receives a synthetic `status` frame
//! reflecting the current state, then the live subscription. Ordering is
//! the bus's publish order; a viewer that stops reading loses the oldest
//! buffered events rather than stalling the supervisor, and dropping the
//! connection drops the subscription.

use std::convert::Infallible;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::Stream;
use recwatch_core::WorkerEvent;
use recwatch_runtime::Supervisor;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{self as stream, StreamExt};

/// Keep-alive interval preventing proxy timeouts on quiet streams.
const KEEP_ALIVE_SECS: u64 = 30;

/// Build the SSE response for one viewer connection.
pub fn event_stream(
    supervisor: &Supervisor,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static + use<>> {
    let (initial, receiver) = supervisor.subscribe();

    let first = stream::iter(serialize(&initial).map(Ok::<_, Infallible>));
    let rest = BroadcastStream::new(receiver).filter_map(|result| match result {
        Ok(event) => serialize(&event).map(Ok::<_, Infallible>),
        Err(e) => {
            // Lagged viewers just skip ahead; the stream itself stays up
            tracing::debug!(error = %e, "viewer stream lagged");
            None
        }
    });

    Sse::new(first.chain(rest)).keep_alive(
        KeepAlive::new()
            .interval(std::time::Duration::from_secs(KEEP_ALIVE_SECS))
            .text("ping"),
    )
}

fn serialize(event: &WorkerEvent) -> Option<Event> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Event::default().data(json)),
        Err(e) => {
            tracing::warn!(error = %e, "failed to serialize event");
            None
        }
    }
}
