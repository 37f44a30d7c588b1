//! API handlers. Each submodule covers one resource; handlers delegate
//! to the supervisor or config store held in [`crate::state::AppState`].

pub mod config;
pub mod control;
pub mod events;
pub mod status;
