//! Tokenline Daemon - Main Entry Point
//! Queue engine + JSON-RPC server + background prune

mod config;
mod logging;
mod storage;
mod telemetry;

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use config::DaemonConfig;
use tokenline_api_rpc::{RpcHandler, RpcServer, RpcServerConfig};
use tokenline_core::application::{
    shutdown_channel, BroadcastNotifier, PruneScheduler, QueueEngine,
};
use tokenline_core::port::id_provider::UuidProvider;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration (defaults < TOKENLINE_CONFIG file < TOKENLINE_* env)
    let config = DaemonConfig::load()?;

    // 2. Initialize logging
    let _log_guard =
        logging::init_logging(config.log_format, config.log_dir.as_deref().map(Path::new))?;

    info!("Tokenline daemon v{} starting...", VERSION);

    if let Err(e) = telemetry::init_telemetry() {
        tracing::warn!(error = ?e, "Failed to initialize OpenTelemetry (continuing without it)");
    }

    // 3. Storage
    let storage = storage::open(&config).await?;

    // 4. Engine (DI wiring)
    let notifier = Arc::new(BroadcastNotifier::default());
    let engine = Arc::new(QueueEngine::new(
        storage.store.clone(),
        storage.directory.clone(),
        notifier.clone(),
        &UuidProvider,
        config.engine_config(),
    ));
    let engine_config = engine.config();
    info!(
        origin = %engine.origin(),
        duplicate_join = ?engine_config.duplicate_join,
        max_cas_retries = engine_config.max_cas_retries,
        minutes_per_person = engine_config.minutes_per_person,
        "Queue engine ready"
    );

    // 5. Start JSON-RPC server
    let handler = RpcHandler::new(
        engine.clone(),
        storage.directory.clone(),
        notifier,
        storage.maintenance.clone(),
        config.rate_limit_burst,
        config.rate_limit_rate,
    );
    let rpc_server = RpcServer::new(
        RpcServerConfig {
            host: config.rpc_host.clone(),
            port: config.rpc_port,
        },
        handler,
    );
    let (rpc_addr, rpc_handle) = rpc_server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    // 6. Start prune scheduler
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let prune_handle = if config.prune_interval_secs > 0 {
        let scheduler = PruneScheduler::new(
            engine.clone(),
            Duration::from_secs(config.prune_interval_secs),
        );
        Some(tokio::spawn(scheduler.run(shutdown_rx)))
    } else {
        info!("Background prune disabled");
        None
    };

    info!(addr = %rpc_addr, "System ready");
    info!("Press Ctrl+C to shutdown");

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 8. Graceful shutdown
    shutdown_tx.shutdown();
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    rpc_handle.stopped().await;
    if let Some(handle) = prune_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }

    info!("Shutdown complete.");

    Ok(())
}
