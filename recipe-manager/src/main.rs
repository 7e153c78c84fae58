//! recipe-manager - Recipe storage and pan scaling service
//!
//! Serves stored recipes and scales them to a caller's pan set. The calculator
//! and balancer run in-process (`engine.mode = "local"`) or in a separate
//! `recipe-engine` (`engine.mode = "remote"`).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::{header, HeaderName, HeaderValue, Method};
use clap::Parser;
use recipe_common::api::CORRELATION_ID_HEADER;
use recipe_common::config::{
    default_database_path, load_config, resolve, resolve_config_path, EngineMode, LogFormat,
    LoggingConfig,
};
use recipe_common::IngredientsBalancer;
use recipe_manager::db::{self, SqliteRecipeRepository};
use recipe_manager::metrics::{install_prometheus, PrometheusMetrics};
use recipe_manager::remote::RemoteEngineClient;
use recipe_manager::{build_router_with_cors, AppState, RecipeService};
use tokio::signal;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const MODULE_NAME: &str = "recipe-manager";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5780;

/// Command-line arguments for recipe-manager
#[derive(Parser, Debug)]
#[command(name = "recipe-manager")]
#[command(about = "Recipe storage and pan scaling service")]
#[command(version)]
struct Args {
    /// TOML config file (falls back to RECIPE_CONFIG, then the platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "RECIPE_MANAGER_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "RECIPE_MANAGER_PORT")]
    port: Option<u16>,

    /// SQLite database file
    #[arg(short, long, env = "RECIPE_DATABASE")]
    database: Option<PathBuf>,

    /// Insert a demonstration recipe if the database is empty
    #[arg(long)]
    seed_demo: bool,
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
    match &config_path {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("No config file, using defaults"),
    }

    let db_path = resolve(
        args.database,
        config.database.path.clone(),
        default_database_path(MODULE_NAME),
    );
    info!("Database path: {}", db_path.display());

    let pool = db::init_database(&db_path)
        .await
        .context("Failed to initialize database")?;
    info!("✓ Database ready");

    if args.seed_demo {
        if let Some(uuid) = db::seed_demo(&pool).await.context("Failed to seed demo data")? {
            info!("Try: POST /recipes/{}/aggregate", uuid);
        }
    }

    let prometheus = install_prometheus().context("Failed to install metrics recorder")?;
    let repository = Arc::new(SqliteRecipeRepository::new(pool));
    let service = match config.engine.mode {
        EngineMode::Local => {
            info!(
                "Engine: local (dough_weight_per_area = {}, percentage_base = {})",
                config.balancer.dough_weight_per_area, config.balancer.percentage_base
            );
            RecipeService::local(repository, IngredientsBalancer::new(config.balancer))
        }
        EngineMode::Remote => {
            let calculator_url = config
                .engine
                .calculator_url
                .as_deref()
                .context("engine.calculator_url is required in remote mode")?;
            let balancer_url = config
                .engine
                .balancer_url
                .as_deref()
                .context("engine.balancer_url is required in remote mode")?;
            info!(
                "Engine: remote (calculator {}, balancer {}, timeout {}s)",
                calculator_url, balancer_url, config.engine.timeout_secs
            );

            let client = Arc::new(RemoteEngineClient::new(
                calculator_url,
                balancer_url,
                Duration::from_secs(config.engine.timeout_secs),
            )?);
            RecipeService::new(repository, client.clone(), client)
        }
    };

    let cors = match &config.server.cors_origin {
        Some(origin) => {
            info!("CORS allowed origin: {}", origin);
            Some(cors_layer(origin)?)
        }
        None => None,
    };

    let service = service.with_metrics(Arc::new(PrometheusMetrics::new()));
    let app = build_router_with_cors(AppState::new(service).with_prometheus(prometheus), cors);

    let host = resolve(args.host, config.server.host.clone(), DEFAULT_HOST.to_string());
    let port = resolve(args.port, config.server.port, DEFAULT_PORT);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("{} listening on http://{}", MODULE_NAME, addr);
    info!("Health check: http://{}/health", addr);
    info!("Metrics: http://{}/metrics", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Install the tracing subscriber
///
/// `RUST_LOG` wins over the configured level.
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

fn cors_layer(origin: &str) -> Result<CorsLayer> {
    let origin: HeaderValue = origin
        .parse()
        .with_context(|| format!("Invalid server.cors_origin: {}", origin))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(CORRELATION_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(CORRELATION_ID_HEADER)]))
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
