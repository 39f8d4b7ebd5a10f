//! tcp-balancer entry point.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────┐
//!                 │                 serve process                 │
//!   Client ──────▶│  net/listener → proxy/server → net/relay     │──────▶ Backend
//!                 │                     │                        │
//!                 │              balancer/selector               │
//!                 └─────────────────────┬────────────────────────┘
//!                                       │ locked read-modify-write
//!                                 registry file (JSON)
//!                                       ▲ generation replace
//!                 ┌─────────────────────┴────────────────────────┐
//!                 │                monitor process                │
//!                 │  health/probe → health/monitor → recovery    │
//!                 └──────────────────────────────────────────────┘
//! ```
//!
//! Both processes read the same TOML config; only the registry file is
//! shared between them at runtime.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tcp_balancer::config::loader::load_config;
use tcp_balancer::health::HealthMonitor;
use tcp_balancer::lifecycle::shutdown::wait_for_signal;
use tcp_balancer::lifecycle::Shutdown;
use tcp_balancer::net::listener::Listener;
use tcp_balancer::observability::metrics;
use tcp_balancer::proxy::BalancerServer;

#[derive(Parser)]
#[command(name = "tcp-balancer")]
#[command(about = "TCP connection load balancer with a health-driven backend registry")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "balancer.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Accept client connections and proxy them to healthy backends
    Serve,
    /// Probe configured backends and keep the registry current
    Monitor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(&config.observability.log_level)
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(config = %cli.config.display(), "tcp-balancer v0.1.0 starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("Shutdown signal received");
        shutdown.trigger();
    });

    match cli.command {
        Commands::Serve => {
            let listener = Listener::bind(&config.listener)?;
            let server = BalancerServer::new(&config);
            server.run(listener, shutdown_rx).await?;
        }
        Commands::Monitor => {
            let monitor = HealthMonitor::new(&config);
            monitor.run(shutdown_rx).await;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
