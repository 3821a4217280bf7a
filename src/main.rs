//! Command gateway binary.
//!
//! Loads a TOML configuration, registers its policies and routes, and forwards
//! authorized commands to the configured backend.
//!
//! ```text
//! Client ──▶ request id / trace / timeout ──▶ health? ──▶ route match ──▶ authorize ──▶ HttpDispatcher ──▶ Backend
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use command_gateway::config::{build_policies, build_routes, load_config};
use command_gateway::dispatch::HttpDispatcher;
use command_gateway::http::{Gateway, HttpServer};
use command_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "command-gateway")]
#[command(about = "Routes and authorizes HTTP requests into backend commands", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    logging::init(&config.observability);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "command-gateway v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let policies = build_policies(&config)?;
    let routes = build_routes(&config)?;
    let dispatcher = HttpDispatcher::new(&config.backend, &config.retries)?;
    tracing::info!(backend = %dispatcher.endpoint(), "Command backend configured");

    let gateway = Arc::new(Gateway::new(routes, policies, dispatcher, config.gateway.clone()));
    let server = HttpServer::new(gateway, &config);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
