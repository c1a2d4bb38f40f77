//! Tagcache - Maintenance runner for the persistent cache
//!
//! Usage: `tagcache [watch|clean|compact|flush]`
//!
//! - `watch` (default): sweep expired entries every `CLEANUP_INTERVAL` seconds
//!   until interrupted
//! - `clean`: sweep expired entries once
//! - `compact`: reclaim database space (slow, locks the database)
//! - `flush`: remove every entry and tag

use std::sync::Arc;

use anyhow::{bail, Context};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tagcache::{spawn_cleanup_task, CacheEngine, Config, Maintenance};

/// Main entry point for the maintenance runner.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Roll the sweep-on-open decision and open the persistent cache
/// 4. Run the requested command
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tagcache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let command = std::env::args().nth(1).unwrap_or_else(|| "watch".to_string());

    let config = Config::from_env();
    info!(
        "Configuration loaded: database={}, default_ttl={}s, clean_probability={}, cleanup_interval={}s",
        config.database_path.display(),
        config.default_ttl,
        config.clean_probability,
        config.cleanup_interval
    );

    let clean_on_open = config.should_clean_on_open(rand::random::<f64>());
    let cache = Arc::new(
        CacheEngine::from_config(&config, clean_on_open).with_context(|| {
            format!("failed to open cache at {}", config.database_path.display())
        })?,
    );

    match command.as_str() {
        "watch" => watch(cache, config.cleanup_interval).await,
        "clean" => {
            let removed = cache.clean()?;
            info!("Removed {} expired entries", removed);
            Ok(())
        }
        "compact" => {
            cache.compact()?;
            info!("Compaction complete");
            Ok(())
        }
        "flush" => {
            cache.flush()?;
            Ok(())
        }
        other => bail!("unknown command '{other}', expected watch, clean, compact or flush"),
    }
}

/// Runs periodic sweeps until Ctrl+C or SIGTERM.
async fn watch<M>(cache: Arc<M>, interval_secs: u64) -> anyhow::Result<()>
where
    M: Maintenance + 'static,
{
    if interval_secs == 0 {
        bail!("CLEANUP_INTERVAL must be at least 1 second");
    }

    let cleanup_handle = spawn_cleanup_task(cache, interval_secs);
    info!("Background sweep task started");

    shutdown_signal().await;

    cleanup_handle.abort();
    warn!("Sweep task aborted");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}
