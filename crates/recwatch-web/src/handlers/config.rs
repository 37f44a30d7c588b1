//! Configuration read/write handlers.
//!
//! `GET` returns the full bundle; `POST` accepts a partial update and
//! merges it over the current on-disk state before writing. A restart
//! of a running worker is handled by the supervisor's config watcher,
//! not here, so the HTTP response returns as soon as the files are
//! persisted.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::State;
use recwatch_core::{ConfigBundle, UrlConfig};
use serde::Deserialize;
use tracing::info;

use crate::error::HttpError;
use crate::state::AppState;

/// Partial configuration update. Absent fields keep their current value.
#[derive(Debug, Deserialize)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub main_config: Option<BTreeMap<String, BTreeMap<String, String>>>,
    #[serde(default)]
    pub url_config: Option<UrlConfig>,
}

/// Return the current configuration bundle.
pub async fn get(State(state): State<AppState>) -> Result<Json<ConfigBundle>, HttpError> {
    let bundle = state.store.read()?;
    Ok(Json(bundle))
}

/// Merge the update over the current bundle and persist it.
pub async fn update(
    State(state): State<AppState>,
    Json(update): Json<ConfigUpdate>,
) -> Result<Json<ConfigBundle>, HttpError> {
    let mut bundle = state.store.read()?;
    if let Some(main_config) = update.main_config {
        bundle.main_config = main_config;
    }
    if let Some(url_config) = update.url_config {
        bundle.url_config = url_config;
    }
    state.store.write(&bundle)?;
    info!("configuration updated");
    Ok(Json(bundle))
}
