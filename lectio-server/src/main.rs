//! lectio-server - Bible study persistence service
//!
//! Serves the verse/note synchronizers, journal manager and chat relay over
//! HTTP, backed by a local SQLite database.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use lectio_common::config::{resolve_root_folder, TomlConfig};
use lectio_common::db::init_database;
use lectio_server::services::chat::OpenAiChatProvider;
use lectio_server::{build_router, AppState};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for lectio-server
#[derive(Parser, Debug)]
#[command(name = "lectio-server")]
#[command(about = "Bible study persistence service")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "LECTIO_PORT")]
    port: Option<u16>,

    /// Interface to bind (overrides the config file)
    #[arg(short, long, env = "LECTIO_BIND")]
    bind: Option<String>,

    /// Root folder holding the database
    #[arg(short, long, env = "LECTIO_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// TOML bootstrap config file
    #[arg(short, long, env = "LECTIO_CONFIG")]
    config: Option<PathBuf>,

    /// Database file (overrides root folder and config file)
    #[arg(short, long, env = "LECTIO_DATABASE")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing starts so its log level can apply; the
    // outcome is logged once the subscriber is installed
    let (config, config_source) = TomlConfig::load_with_source(args.config.as_deref());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("lectio_server=debug,tower_http=debug,{}", config.logging.level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting lectio-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    config_source.log();

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &config);
    let db_path = args
        .database
        .clone()
        .unwrap_or_else(|| config.database_path(&root_folder));
    info!("Root folder: {}", root_folder.display());
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let chat = OpenAiChatProvider::new(&config.chat).context("Failed to build chat client")?;
    if chat.has_api_key() {
        info!("Chat relay using model {} at {}", config.chat.model, config.chat.base_url);
    } else {
        warn!(
            "{} is not set; /api/chat will answer with failures",
            config.chat.api_key_env
        );
    }

    let state = AppState::new(pool.clone(), Arc::new(chat));
    let app = build_router(state);

    let bind = args.bind.unwrap_or_else(|| config.bind.clone());
    let port = args.port.unwrap_or(config.port);
    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", bind, port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("lectio-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
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
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
