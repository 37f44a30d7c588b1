//! Live event stream handler.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use futures_util::Stream;

use crate::state::AppState;

/// Subscribe to the worker event stream over SSE. The first frame is
/// always a status snapshot so a freshly connected dashboard renders
/// the correct indicator immediately.
pub async fn stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static> {
    crate::sse::event_stream(&state.supervisor)
}
