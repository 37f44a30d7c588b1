//! Server bootstrap - the composition root.
//!
//! This module is the only place where the config store, event bus and
//! supervisor are wired together for the web adapter.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use recwatch_core::ConfigStore;
use recwatch_runtime::{EventBus, Supervisor, WorkerCommand};
use tracing::info;

/// Server configuration for the web adapter.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address for the HTTP server.
    pub host: String,
    /// Port for the HTTP server.
    pub port: u16,
    /// Directory holding the recorder's configuration files.
    pub config_dir: PathBuf,
    /// Program used to launch the recorder worker.
    pub worker: String,
    /// Arguments passed to the worker program.
    pub worker_args: Vec<String>,
    /// Working directory the worker runs in.
    pub workdir: PathBuf,
    /// Grace period before an unresponsive worker is force-killed.
    pub grace: Duration,
    /// Optional API token; `None` leaves the API open.
    pub auth_token: Option<String>,
    /// Optional path to static assets overriding the built-in page.
    pub static_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Create a config matching the recorder's conventional layout: the
    /// worker is `python3 -u main.py` run from the current directory,
    /// with config files under `./config`.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5678,
            config_dir: PathBuf::from("config"),
            worker: "python3".to_string(),
            worker_args: vec!["-u".to_string(), "main.py".to_string()],
            workdir: PathBuf::from("."),
            grace: Duration::from_secs(5),
            auth_token: None,
            static_dir: None,
        }
    }

    /// Set the static directory overriding the built-in dashboard.
    #[must_use]
    pub fn with_static_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(path.into());
        self
    }

    /// Require `token` on every API request.
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

/// Shared context for the web adapter. Handlers receive this as
/// [`crate::state::AppState`].
pub struct WebContext {
    /// The worker supervisor.
    pub supervisor: Arc<Supervisor>,
    /// The configuration store backing `/api/config`.
    pub store: Arc<ConfigStore>,
}

/// Wire up the store, bus and supervisor, and start the config watcher.
///
/// The watcher task restarts a running worker whenever the store is
/// written; it runs for the life of the process.
pub fn bootstrap(config: &ServerConfig) -> Result<WebContext> {
    let store = Arc::new(ConfigStore::new(&config.config_dir)?);

    let command = WorkerCommand::new(&config.worker, &config.workdir)
        .with_args(config.worker_args.iter().cloned());

    let supervisor = Arc::new(Supervisor::new(
        command,
        config.grace,
        store.clone(),
        EventBus::default(),
    ));
    // Detached: the watcher runs until the process exits.
    let _watcher = supervisor.watch_config_changes();

    info!(
        config_dir = %config.config_dir.display(),
        worker = %config.worker,
        workdir = %config.workdir.display(),
        "supervisor initialized"
    );

    Ok(WebContext { supervisor, store })
}

/// Start the web server.
///
/// If `config.static_dir` is set, serves static assets with a fallback
/// to their `index.html`. Otherwise the built-in dashboard page is
/// served at `/`.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    use tokio::net::TcpListener;

    let ctx = bootstrap(&config)?;

    let app = if let Some(ref static_dir) = config.static_dir {
        info!("serving static assets from {}", static_dir.display());
        crate::routes::create_static_router(ctx, static_dir, config.auth_token.as_deref())
    } else {
        crate::routes::create_router(ctx, config.auth_token.as_deref())
    };

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;

    if config.auth_token.is_some() {
        info!("recwatch listening on http://{addr} (token required)");
    } else {
        info!("recwatch listening on http://{addr}");
    }

    axum::serve(listener, app).await?;
    Ok(())
}
