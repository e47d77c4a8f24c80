//! anchorview-daemon: serves the anchored price oracle.
//!
//! Single OS process running a Tokio async runtime. Reporters, keepers and
//! consumers talk to the daemon via JSON-RPC over a Unix socket. All oracle
//! writes are serialized through one lock.

mod commands;
mod config;
mod events;
mod rpc;

use std::sync::Arc;

use anchorview_oracle::market::InMemoryMarket;
use anchorview_oracle::reporter::{Ed25519Recovery, SignedPriceStore};
use anchorview_oracle::{Capabilities, PriceOracle};
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info};

use crate::config::DaemonConfig;
use crate::events::EventBus;
use crate::rpc::RpcServer;

/// Daemon-wide shared state.
pub struct DaemonState {
    pub oracle: Mutex<PriceOracle>,
    /// Market table the anchors read; fed by `submit_market_snapshot`.
    pub market: Arc<InMemoryMarket>,
    pub config: DaemonConfig,
    /// Event bus for pushing events to subscribers.
    pub event_bus: EventBus,
    /// Shutdown signal sender.
    pub shutdown_tx: broadcast::Sender<()>,
}

impl DaemonState {
    /// Seed the markets, build the directory and construct the oracle.
    pub fn build(
        config: DaemonConfig,
        event_bus: EventBus,
        shutdown_tx: broadcast::Sender<()>,
        now: u64,
    ) -> anyhow::Result<Self> {
        let market = Arc::new(config.seed_markets(now)?);
        let recovery = Arc::new(Ed25519Recovery);
        let capabilities = Capabilities {
            market: market.clone(),
            store: Box::new(SignedPriceStore::new(recovery.clone())),
            recovery,
            directory: Arc::new(config.directory.build()),
        };
        let mut oracle = PriceOracle::new(&config.oracle, capabilities, now)?;
        event_bus.emit_oracle(&oracle.take_events(), now);

        Ok(Self {
            oracle: Mutex::new(oracle),
            market,
            config,
            event_bus,
            shutdown_tx,
        })
    }
}

/// Current Unix time in seconds.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("anchorview=info".parse()?),
        )
        .init();

    info!("anchorview daemon starting");

    // 1. Load config
    let config = DaemonConfig::load()?;
    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let socket_path = config.socket_path();
    info!(log_level = %config.daemon.log_level, "configuration loaded");

    // 2. Create event bus and shutdown channel
    let event_bus = EventBus::new(config.daemon.event_buffer);
    let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);

    // 3. Build the oracle
    let state = Arc::new(DaemonState::build(
        config,
        event_bus,
        shutdown_tx.clone(),
        unix_now(),
    )?);
    {
        let oracle = state.oracle.lock().await;
        let status = oracle.status();
        info!(
            tokens = status.config_count,
            anchor_period = status.anchor_period,
            public_mode = status.public_mode,
            "oracle ready"
        );
    }

    // 4. Start IPC server
    let rpc_server = RpcServer::new(state.clone(), socket_path.clone());
    info!("Starting JSON-RPC server on {:?}", socket_path);

    state.event_bus.emit(events::Event {
        event_type: "DaemonStarted".to_string(),
        timestamp: unix_now(),
        payload: serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
        }),
    });

    // 5. Run the RPC server until shutdown
    let mut shutdown_rx = shutdown_tx.subscribe();
    tokio::select! {
        result = rpc_server.run() => {
            if let Err(e) = result {
                error!("RPC server error: {}", e);
            }
        }
        _ = shutdown_rx.recv() => {
            info!("Shutdown signal received");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    // Clean up socket file
    let _ = std::fs::remove_file(&socket_path);

    info!("Daemon stopped");
    Ok(())
}
