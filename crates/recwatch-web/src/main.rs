//! recwatch entry point.
//!
//! Parses the command line, builds a [`ServerConfig`] and hands off to
//! the server bootstrap. All wiring lives in the library crate.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use recwatch_web::ServerConfig;
use tracing_subscriber::EnvFilter;

/// Process supervisor and live dashboard for a recorder worker.
#[derive(Debug, Parser)]
#[command(name = "recwatch", version, about)]
struct Cli {
    /// Bind address for the HTTP server.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port for the HTTP server.
    #[arg(long, default_value_t = 5678)]
    port: u16,

    /// Directory holding the recorder's configuration files.
    #[arg(long, default_value = "config")]
    config_dir: PathBuf,

    /// Program used to launch the recorder worker.
    #[arg(long, default_value = "python3")]
    worker: String,

    /// Argument passed to the worker program (repeatable).
    #[arg(long = "worker-arg", default_values_t = ["-u".to_string(), "main.py".to_string()])]
    worker_args: Vec<String>,

    /// Working directory the worker runs in.
    #[arg(long, default_value = ".")]
    workdir: PathBuf,

    /// Seconds to wait for a graceful worker exit before force-killing.
    #[arg(long, default_value_t = 5)]
    grace_secs: u64,

    /// API token; when set every /api request must present it.
    #[arg(long, env = "RECWATCH_TOKEN")]
    token: Option<String>,

    /// Generate a random API token at startup and print it.
    #[arg(long, conflicts_with = "token")]
    generate_token: bool,

    /// Serve static assets from this directory instead of the built-in page.
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let auth_token = if cli.generate_token {
        let token = uuid::Uuid::new_v4().to_string();
        // Printed once so operators can copy it; never logged again.
        println!("API token: {token}");
        Some(token)
    } else {
        cli.token
    };

    let config = ServerConfig {
        host: cli.host,
        port: cli.port,
        config_dir: cli.config_dir,
        worker: cli.worker,
        worker_args: cli.worker_args,
        workdir: cli.workdir,
        grace: Duration::from_secs(cli.grace_secs),
        auth_token,
        static_dir: cli.static_dir,
    };

    recwatch_web::start_server(config).await
}
