//! Schema orchestrator server
//!
//! Loads the registry configuration, initialises logging and serves the
//! schema orchestration API until interrupted.

use anyhow::Context;
use clap::Parser;
use schema_orchestrator_api::{build_router, AppState};
use schema_orchestrator_service::{RegistryConfig, SchemaOrchestrator, StaticConnectionResolver};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "schema-orchestrator", version, about = "Schema registry orchestration API")]
struct Cli {
    /// Path to the registry configuration file (TOML)
    #[arg(long, env = "SCHEMA_ORCHESTRATOR_CONFIG", default_value = "config/registry.toml")]
    config: PathBuf,

    /// Address to bind
    #[arg(long, env = "SCHEMA_ORCHESTRATOR_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to bind
    #[arg(long, env = "SCHEMA_ORCHESTRATOR_PORT", default_value_t = 8080)]
    port: u16,

    /// Emit logs as JSON
    #[arg(long, env = "SCHEMA_ORCHESTRATOR_LOG_JSON")]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = RegistryConfig::load(&cli.config)
        .await
        .with_context(|| format!("loading {}", cli.config.display()))?;
    info!(
        environments = config.environments.len(),
        timeout_secs = config.request_timeout_secs,
        "Registry configuration ready"
    );

    let resolver = StaticConnectionResolver::new(config).context("building registry client")?;
    let orchestrator = SchemaOrchestrator::new(Arc::new(resolver));
    let app = build_router(AppState::new(orchestrator)).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", cli.host, cli.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    info!(%addr, "Schema orchestrator listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}
