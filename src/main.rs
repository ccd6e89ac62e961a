//! zipstream — streams ZIP archives of directories over HTTP.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌────────────────────────────────────────────┐
//!                     │                 ZIPSTREAM                   │
//!                     │                                             │
//!   GET /archive/{id}/│  ┌─────────┐      ┌──────────────────────┐ │
//!   ──────────────────┼─▶│  http   │─────▶│   archive pipeline    │ │
//!                     │  │ server  │      │ sanitize → validate   │ │
//!                     │  └─────────┘      │ → spawn zip → relay   │ │
//!                     │       ▲           └──────────┬───────────┘ │
//!                     │       │                      │ stdout      │
//!   streamed ZIP body │       │    bounded chunks    ▼             │
//!   ◀─────────────────┼───────┴──────────────┌──────────────┐      │
//!                     │                      │ zip -r - {id}│      │
//!                     │                      │  (child proc)│      │
//!                     │                      └──────────────┘      │
//!                     │  ┌───────────────────────────────────────┐ │
//!                     │  │   config (CLI + TOML, immutable)       │ │
//!                     │  └───────────────────────────────────────┘ │
//!                     └────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zipstream::config::loader::{load_config, ConfigError};
use zipstream::config::validation::validate_config;
use zipstream::http::HttpServer;
use zipstream::ServerConfig;

#[derive(Parser)]
#[command(name = "zipstream")]
#[command(about = "Streams ZIP archives of directories over HTTP", long_about = None)]
struct Cli {
    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory containing the archive source directories
    #[arg(short = 'p', long)]
    source_path: Option<PathBuf>,

    /// Insert a fixed delay between chunks (debugging aid)
    #[arg(short, long)]
    throttle: bool,

    /// Address to listen on, e.g. "0.0.0.0:8080"
    #[arg(short, long)]
    bind: Option<String>,

    /// Path of the HTML page served at /
    #[arg(long)]
    index: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zipstream=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("zipstream v0.1.0 starting");

    let cli = Cli::parse();

    // File values first, CLI flags override.
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(source_path) = cli.source_path {
        config.delivery.source_root = source_path;
    }
    if cli.throttle {
        config.delivery.throttle = true;
    }
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Some(index) = cli.index {
        config.delivery.index_path = index;
    }

    // Overrides can invalidate a previously valid config, so validate again.
    validate_config(&config).map_err(ConfigError::Validation)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        source_root = %config.delivery.source_root.display(),
        throttle = config.delivery.throttle,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let server = HttpServer::new(config);
    server.run(listener).await?;

    Ok(())
}
