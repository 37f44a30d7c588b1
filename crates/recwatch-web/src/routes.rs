//! Route definitions and router construction.
//!
//! The API lives under `/api`; the dashboard page and `/health` sit at
//! the root and are never token-gated so reverse-proxy health probes
//! keep working.

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Html;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};

use crate::auth::TokenGate;
use crate::bootstrap::WebContext;
use crate::handlers;
use crate::state::AppState;

/// Dashboard page shipped with the binary.
const DASHBOARD_HTML: &str = include_str!("../assets/dashboard.html");

/// Permissive CORS so the dashboard can be embedded or proxied freely.
fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build all API routes without the `/api` prefix (for nesting under
/// `/api`). The caller applies `.with_state()` before nesting.
pub(crate) fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(handlers::status::get))
        .route("/control/start", post(handlers::control::start))
        .route("/control/stop", post(handlers::control::stop))
        .route(
            "/config",
            get(handlers::config::get).post(handlers::config::update),
        )
        .route("/events", get(handlers::events::stream))
}

/// Create the main router: dashboard page, health check, and the API
/// nested under `/api` with CORS and the optional token gate applied.
pub fn create_router(ctx: WebContext, auth_token: Option<&str>) -> Router {
    let state: AppState = Arc::new(ctx);

    let mut api = api_routes().with_state(state);
    if let Some(token) = auth_token {
        let gate = TokenGate::new(token);
        api = api.layer(middleware::from_fn(move |req: Request, next: Next| {
            gate.clone().check(req, next)
        }));
    }
    // CORS outermost so preflight requests are answered before the gate
    let api = api.layer(build_cors_layer());

    Router::new()
        .route("/", get(dashboard))
        .route("/health", get(health_check))
        .nest("/api", api)
}

/// Create a router that additionally serves static assets from
/// `static_dir`, falling back to its `index.html` for unmatched paths.
/// API routes take priority over the static tree.
pub fn create_static_router<P: AsRef<Path>>(
    ctx: WebContext,
    static_dir: P,
    auth_token: Option<&str>,
) -> Router {
    let static_path = static_dir.as_ref();
    let index_path = static_path.join("index.html");
    let serve_dir = ServeDir::new(static_path).fallback(ServeFile::new(&index_path));

    create_router(ctx, auth_token).fallback_service(serve_dir)
}

/// Built-in dashboard page.
async fn dashboard() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

/// Health check endpoint.
pub(crate) async fn health_check() -> &'static str {
    "OK"
}
