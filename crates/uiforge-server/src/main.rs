//! uiforge API server binary.
//!
//! Loads configuration (defaults → TOML file → environment), constructs the
//! provider and shared services, and serves the REST API.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use uiforge_core::config::Config;
use uiforge_core::llm::factory::create_provider;
use uiforge_server::state::AppState;

/// uiforge API server — mockup-to-project generation over HTTP.
#[derive(Parser)]
#[command(name = "uiforge-server", version, about)]
struct Cli {
    /// Port to listen on (overrides config).
    #[arg(long)]
    port: Option<u16>,

    /// Host address to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Path to the configuration file.
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (respects RUST_LOG env var).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let config_path = cli
        .config
        .map(std::path::PathBuf::from)
        .unwrap_or_else(Config::default_path);

    let mut config = Config::load(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    config.validate().context("invalid configuration")?;

    let provider = create_provider(&config.llm).context("constructing LLM provider")?;

    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        model = %config.llm.model,
        cache = config.cache.enabled,
        rate_limit = config.limits.rate_limit_enabled,
        "starting uiforge server",
    );

    let bind = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, provider));
    let router = uiforge_server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {bind}"))?;

    tracing::info!(addr = %bind, "listening");
    axum::serve(listener, router).await.context("server error")?;

    Ok(())
}
