//! sentiprep - sentiment dataset preparation service
//!
//! Accepts CSV uploads, then cleans, labels and trains classifiers on them as
//! background jobs. Job state and model metadata live in a SQLite store in
//! the root folder; files live in its object store directory.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sentiprep::config::{Capabilities, ServiceSettings};
use sentiprep::services::FsObjectStore;
use sentiprep::AppState;
use sentiprep_common::config::{self as bootstrap, TomlConfig, DATABASE_FILE, OBJECTS_DIR};
use tokio::signal;
use tracing::{error, info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "sentiprep")]
#[command(about = "Sentiment dataset preparation and training service")]
#[command(version)]
struct Args {
    /// Root folder holding the metadata store and object store
    #[arg(short, long, env = "SENTIPREP_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, env = "SENTIPREP_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP port (overrides the configuration file)
    #[arg(short, long, env = "SENTIPREP_PORT")]
    port: Option<u16>,

    /// Bind address (overrides the configuration file)
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Configuration decides the log level, so it is loaded under a plain
    // bootstrap subscriber
    let bootstrap_subscriber = tracing_subscriber::fmt().with_max_level(Level::INFO).finish();
    let config = tracing::subscriber::with_default(bootstrap_subscriber, || {
        TomlConfig::load_or_default(args.config.as_deref())
    });

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},tower_http=info", config.logging.level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting sentiprep v{}", env!("CARGO_PKG_VERSION"));

    let root_folder = bootstrap::resolve_root_folder(args.root_folder.as_deref(), &config);
    bootstrap::ensure_root_folder(&root_folder)
        .with_context(|| format!("Failed to initialize root folder {}", root_folder.display()))?;
    info!("Root folder: {}", root_folder.display());

    let db_path = root_folder.join(DATABASE_FILE);
    let pool = sentiprep_common::db::init_database(&db_path)
        .await
        .context("Failed to open metadata store")?;

    let store = FsObjectStore::new(root_folder.join(OBJECTS_DIR));
    info!("Object store: {}", store.root().display());

    let state = AppState::new(pool, Arc::new(store))
        .with_capabilities(Capabilities::resolve(&config))
        .with_settings(ServiceSettings::from_config(&config));
    let app = sentiprep::build_router(state);

    let bind = args.bind.unwrap_or(config.bind_address);
    let port = args.port.unwrap_or(config.port);
    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", bind, port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
