//! Pizza service telemetry host.
//!
//! ```text
//!   client ──▶ request id ─▶ trace ─▶ timeout ─▶ track_requests ─▶ log_http
//!                                                                    │
//!                                         log_unhandled_errors ◀─────┘
//!                                                   │
//!                                            catch panic ─▶ routes
//!
//!   track_requests / business events / sampler ──▶ MetricsSender ─┐
//!   log_http / log_unhandled_errors ─────────────▶ LogShipper ────┤
//!                                                                 ▼
//!                                                   Dispatcher (bounded, fire-and-forget)
//!                                                                 │
//!                                                    log sink / metrics sink
//! ```

use std::path::PathBuf;

use axum::Router;
use clap::Parser;
use tokio::net::TcpListener;

use pizza_telemetry::config::{load_config, TelemetryConfig};
use pizza_telemetry::lifecycle::{wait_for_signal, Shutdown};
use pizza_telemetry::metrics::install_global;
use pizza_telemetry::observability::{logging::init_tracing, metrics::init_metrics};
use pizza_telemetry::{HttpServer, Telemetry};

#[derive(Parser)]
#[command(name = "pizza-telemetry")]
#[command(about = "Logging and metrics instrumentation for the pizza service", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => TelemetryConfig::default(),
    };

    init_tracing(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "pizza-telemetry starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.listener.request_timeout_secs,
        metrics_period_secs = config.metrics.period_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let telemetry = Telemetry::from_config(config)?;
    if !install_global(telemetry.aggregator().clone()) {
        tracing::warn!("A metrics aggregator was already installed");
    }

    let shutdown = Shutdown::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            shutdown.trigger();
        });
    }

    HttpServer::new(telemetry, Router::new())
        .run(listener, shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
