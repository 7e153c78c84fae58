//! recipe-engine - Pan calculator and ingredient balancer service
//!
//! Remote engine for recipe-manager. Holds no data; every request carries the
//! pans or the recipe it works on.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use recipe_common::config::{load_config, resolve, resolve_config_path, LogFormat, LoggingConfig};
use recipe_common::IngredientsBalancer;
use recipe_engine::{build_router, AppState};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const MODULE_NAME: &str = "recipe-engine";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5781;

/// Command-line arguments for recipe-engine
#[derive(Parser, Debug)]
#[command(name = "recipe-engine")]
#[command(about = "Pan calculator and ingredient balancer service")]
#[command(version)]
struct Args {
    /// TOML config file (falls back to RECIPE_CONFIG, then the platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "RECIPE_ENGINE_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "RECIPE_ENGINE_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref(), MODULE_NAME);
    let config = load_config(config_path.as_deref()).context("Failed to load configuration")?;

    init_tracing(&config.logging);

    info!(
        "Starting {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
    if let Some(path) = &config_path {
        info!("Config file: {}", path.display());
    }
    let balancer = IngredientsBalancer::new(config.balancer);
    info!(
        "Balancer: dough_weight_per_area = {}, percentage_base = {}",
        balancer.config().dough_weight_per_area,
        balancer.config().percentage_base
    );

    let app = build_router(AppState::new(balancer));

    let host = resolve(args.host, config.server.host.clone(), DEFAULT_HOST.to_string());
    let port = resolve(args.port, config.server.port, DEFAULT_PORT);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("{} listening on http://{}", MODULE_NAME, addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let registry = tracing_subscriber::registry().with(filter);

    match logging.format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
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
