use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use magbridge_core::{BridgeConfig, SharedIndicator, SimulatedMagnetometer};
use magbridge_server::{init_sensor, join_with_retry, BroadcastServer, ClientExit, DeviceClient};

/// Magnetometer telemetry bridge.
#[derive(Parser)]
#[command(name = "magbridge", about = "Stream magnetometer telemetry over WebSocket")]
struct Cli {
    /// JSON configuration file; missing fields use defaults.
    #[arg(long, short)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Stream samples to a peer and obey its commands.
    Client {
        /// Peer host name or address.
        #[arg(long)]
        host: Option<String>,

        /// Peer port.
        #[arg(long)]
        port: Option<u16>,

        /// WebSocket path on the peer.
        #[arg(long)]
        path: Option<String>,

        /// Milliseconds between samples.
        #[arg(long)]
        interval_ms: Option<u64>,
    },
    /// Broadcast synthetic samples to every connected client.
    Server {
        /// Address:port to listen on.
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// Milliseconds between broadcasts (0 = every loop iteration).
        #[arg(long)]
        interval_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,magbridge_server=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => BridgeConfig::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => BridgeConfig::default(),
    };
    apply_overrides(&mut config, &cli.mode);
    match cli.mode {
        Mode::Client { .. } => config.validate_client()?,
        Mode::Server { .. } => config.validate_server()?,
    }

    tracing::info!("magbridge starting...");

    // Wait for shutdown signal
    tokio::select! {
        result = run_mode(&cli.mode, config) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Fold command-line flags over the loaded configuration.
fn apply_overrides(config: &mut BridgeConfig, mode: &Mode) {
    match mode {
        Mode::Client {
            host,
            port,
            path,
            interval_ms,
        } => {
            if let Some(host) = host {
                config.client.host = host.clone();
            }
            if let Some(port) = port {
                config.client.port = *port;
            }
            if let Some(path) = path {
                config.client.path = path.clone();
            }
            if let Some(interval_ms) = interval_ms {
                config.client.send_interval_ms = *interval_ms;
            }
        }
        Mode::Server { bind, interval_ms } => {
            if let Some(bind) = bind {
                config.server.bind_addr = *bind;
            }
            if let Some(interval_ms) = interval_ms {
                config.server.broadcast_interval_ms = *interval_ms;
            }
        }
    }
}

async fn run_mode(mode: &Mode, config: BridgeConfig) -> anyhow::Result<()> {
    match mode {
        Mode::Client { .. } => run_client(config).await,
        Mode::Server { .. } => {
            BroadcastServer::new(config.server).run().await?;
            Ok(())
        }
    }
}

/// Startup, then stream until RESET; a restart repeats startup from scratch.
async fn run_client(config: BridgeConfig) -> anyhow::Result<()> {
    let sim = &config.simulator;

    loop {
        let info = join_with_retry(&config.network, &config.client, &config.startup.network_retry)
            .await
            .context("Network join failed")?;
        tracing::info!("Local address {}", info.local_addr);

        let mut sensor = SimulatedMagnetometer::new(sim.strength_ut, sim.start_bearing_deg, sim.step_deg);
        init_sensor(&mut sensor, &config.startup.sensor_retry)
            .await
            .context("Magnetometer not found")?;

        let mut client = DeviceClient::new(config.client.clone(), sensor, SharedIndicator::new());
        tracing::info!("Streaming to {}", config.client.url());

        match client.run().await? {
            ClientExit::RestartRequested => {
                tracing::info!("Restarting...");
            }
        }
    }
}
