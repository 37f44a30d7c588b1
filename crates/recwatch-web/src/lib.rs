//! Axum web adapter for the recwatch supervisor.
//!
//! Exposes the dashboard page, the control/config/status API, and the
//! per-viewer SSE event stream. All wiring happens in [`bootstrap`]; the
//! handlers only ever talk to the shared [`state::AppState`].

pub mod auth;
pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod sse;
pub mod state;

// Re-export primary types
pub use bootstrap::{ServerConfig, WebContext, bootstrap, start_server};
pub use error::HttpError;
pub use routes::{create_router, create_static_router};
pub use state::AppState;
