//! Status handler - worker state snapshot.

use axum::Json;
use axum::extract::State;
use recwatch_core::WorkerState;
use serde::Serialize;

use crate::state::AppState;

/// Status response body.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Dashboard indicator: is the worker currently recording.
    pub is_running: bool,
    /// Full lifecycle state for clients that want the detail.
    pub state: WorkerState,
}

/// Report the worker's current state. Never blocks on an in-flight
/// lifecycle command.
pub async fn get(State(state): State<AppState>) -> Json<StatusResponse> {
    let current = state.supervisor.status();
    Json(StatusResponse {
        is_running: current.is_running(),
        state: current,
    })
}
