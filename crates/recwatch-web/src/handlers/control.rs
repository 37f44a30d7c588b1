//! Start/stop control handlers.

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use tracing::info;

use crate::error::HttpError;
use crate::state::AppState;

/// Body returned by the control endpoints.
#[derive(Debug, Serialize)]
pub struct ControlResponse {
    pub status: &'static str,
    pub message: String,
}

impl ControlResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: message.into(),
        }
    }
}

/// Start the recorder worker. A no-op when it is already running.
pub async fn start(State(state): State<AppState>) -> Result<Json<ControlResponse>, HttpError> {
    info!("control: start requested");
    state.supervisor.start().await?;
    Ok(Json(ControlResponse::success("recorder started")))
}

/// Stop the recorder worker. A no-op when it is already stopped.
pub async fn stop(State(state): State<AppState>) -> Result<Json<ControlResponse>, HttpError> {
    info!("control: stop requested");
    state.supervisor.stop().await?;
    Ok(Json(ControlResponse::success("recorder stopped")))
}
