//! Edge Gateway
//!
//! An API gateway fronting an API origin and a static-content origin,
//! built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌───────────────────────────────────────────────────┐
//!                    │                   EDGE GATEWAY                    │
//!                    │                                                   │
//!   Client Request   │  ┌─────────┐   ┌─────────┐   ┌──────────────┐    │
//!   ─────────────────┼─▶│  http   │──▶│ routing │──▶│  auth gate   │    │
//!                    │  │ server  │   │  table  │   │ + provider   │    │
//!                    │  └─────────┘   └─────────┘   └──────┬───────┘    │
//!                    │                                     │            │
//!                    │                                     ▼            │
//!   Client Response  │  ┌─────────┐   ┌──────────────────────────┐     │    ┌──────────┐
//!   ◀────────────────┼──│response │◀──│   upstream dispatcher    │◀────┼──── │  origin  │
//!                    │  │ stream  │   │  (per-origin pools)      │     │    │ servers  │
//!                    │  └─────────┘   └──────────────────────────┘     │    └──────────┘
//!                    │                                                   │
//!                    │  ┌─────────────────────────────────────────────┐ │
//!                    │  │            Cross-Cutting Concerns            │ │
//!                    │  │  ┌────────┐ ┌─────────────┐ ┌────────────┐  │ │
//!                    │  │  │ config │ │observability│ │ lifecycle  │  │ │
//!                    │  │  └────────┘ └─────────────┘ └────────────┘  │ │
//!                    │  └─────────────────────────────────────────────┘ │
//!                    └───────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use edge_gateway::auth::{AuthGate, HttpTokenProvider, TokenCache, TokenProvider};
use edge_gateway::config::load_config;
use edge_gateway::lifecycle::{signals, startup};
use edge_gateway::observability::{logging, metrics};
use edge_gateway::{Dispatcher, HttpServer, RouteTable, Shutdown};

#[derive(Parser, Debug)]
#[command(
    name = "edge-gateway",
    version,
    about = "API gateway fronting an API origin and a static-content origin"
)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,

    /// Validate the configuration and exit.
    #[arg(long)]
    validate_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let args = Args::parse();

    tracing::info!("edge-gateway v0.1.0 starting");

    let config = load_config(&args.config)?;
    if args.validate_config {
        tracing::info!(path = %args.config.display(), "configuration is valid");
        return Ok(());
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        api_origin = %config.upstreams.api_origin,
        content_origin = %config.upstreams.content_origin,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.startup.dump_env {
        startup::log_environment();
    }

    let table = RouteTable::standard(
        &config.upstreams.api_origin,
        &config.upstreams.content_origin,
    )?;
    for rule in table.rules() {
        tracing::info!("forwarding [{}] to [{}]", rule.pattern(), rule.upstream());
    }

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let provider = Arc::new(HttpTokenProvider::new(&config.auth)?);
    let provider: Arc<dyn TokenProvider> = Arc::new(TokenCache::new(
        provider,
        Duration::from_secs(config.auth.cache_skew_secs),
    ));
    let gate = AuthGate::new(provider);
    let dispatcher = Dispatcher::new(&table, &config.timeouts);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let liveness_file = config.startup.liveness_file.clone();
    if let Some(path) = &liveness_file {
        startup::write_liveness_file(path);
    }

    let shutdown = Shutdown::new();
    signals::spawn_handler(&shutdown);

    let server = HttpServer::new(&config, table, gate, dispatcher);
    server.run(listener, shutdown.subscribe()).await?;

    if let Some(path) = &liveness_file {
        startup::remove_liveness_file(path);
    }

    tracing::info!("shutdown complete");
    Ok(())
}
