//! Facebatch daemon: submit face-swap tasks over JSON-RPC and poll them to completion

mod logging;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use facebatch_api_rpc::{RateLimiter, RpcHandler, RpcServer, RpcServerConfig};
use facebatch_core::application::{EngineHandle, MediaPipeline, TaskRegistry};
use facebatch_core::port::id_provider::UuidProvider;
use facebatch_core::port::time_provider::SystemTimeProvider;
use facebatch_core::VERSION;
use facebatch_infra_system::{Adapters, ConfigLoader};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Logging
    let json_logs = std::env::var(logging::LOG_FORMAT_ENV)
        .map(|format| format == "json")
        .unwrap_or(false);
    let log_dir = std::env::var_os(logging::LOG_DIR_ENV).map(std::path::PathBuf::from);
    let _log_guard = logging::init(json_logs, log_dir.as_deref())?;

    info!(version = VERSION, "facebatchd starting");

    // 2. Configuration
    let config = ConfigLoader::new().load().context("loading configuration")?;
    for dir in [
        &config.paths.upload_source_dir,
        &config.paths.upload_target_dir,
        &config.paths.output_dir,
        &config.paths.temp_dir,
    ] {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating {}", dir.display()))?;
    }

    // 3. Wiring
    let adapters = Adapters::from_config(&config);
    let engine = Arc::new(EngineHandle::new(adapters.engine.clone()));
    let pipeline = Arc::new(
        MediaPipeline::new(engine.clone(), adapters.media.clone())
            .with_default_fps(config.media.default_fps),
    );
    let registry = Arc::new(TaskRegistry::new(
        pipeline,
        Arc::new(UuidProvider),
        Arc::new(SystemTimeProvider),
        config.paths.output_dir.clone(),
        config.paths.temp_dir.clone(),
    ));

    // Warm the engine so the first submission does not pay for model checks
    tokio::spawn(async move {
        match engine.ensure_initialized().await {
            Ok(()) => info!("Transform engine ready"),
            Err(e) => warn!(error = %e, "Transform engine warm-up failed; retrying on first task"),
        }
    });

    // 4. JSON-RPC server
    let handler = RpcHandler::new(
        registry,
        adapters.monitor.clone(),
        Arc::new(config.thresholds.clone()),
        &config.paths,
        RateLimiter::new(config.server.rate_limit_burst, config.server.rate_limit_per_sec),
    );
    let (addr, rpc_handle) = RpcServer::new(RpcServerConfig::from(&config.server), handler)
        .start()
        .await
        .context("starting JSON-RPC server")?;

    info!(address = %addr, "Ready. Press Ctrl+C to shut down");

    // 5. Shutdown
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    rpc_handle.stopped().await;

    info!("Shutdown complete");
    Ok(())
}
