//! AI-Mem sync watcher entry point
//!
//! Run with:
//! ```bash
//! AIMEM_WORKSPACE=team-design cargo run -p aimem-sync
//! ```
//!
//! Configuration is loaded from environment variables.

use aimem_cache::create_shared_cache;
use aimem_common::{
    try_init_tracing_with_config, AppError, ClientConfig, Environment, ErrorResponse,
    TracingConfig,
};
use aimem_sync::SyncClient;
use anyhow::Context;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Pick pretty or JSON output before the rest of the config is validated
    let _ = dotenvy::dotenv();
    let env = std::env::var("APP_ENV")
        .map(|value| Environment::from(value.as_str()))
        .unwrap_or_default();
    let tracing_config = TracingConfig::for_environment(env);

    // Initialize tracing
    if let Err(e) = try_init_tracing_with_config(tracing_config) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    // Run the watcher
    if let Err(e) = run().await {
        error!(error = ?e, "Sync watcher failed");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    info!("Starting AI-Mem sync watcher...");

    let config = ClientConfig::from_env().map_err(AppError::from)?;

    let workspace = config
        .sync
        .workspace
        .clone()
        .context("AIMEM_WORKSPACE must be set to watch a workspace")?;

    info!(
        env = ?config.app.env,
        endpoint = %config.sync.url,
        workspace_id = %workspace,
        "Configuration loaded"
    );

    let cache = create_shared_cache();
    let mut cache_events = cache.subscribe();
    let client = SyncClient::new(&config.sync, cache.clone());
    let mut status = client.watch_status();
    let mut presence = client.watch_presence();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    warn!(error = %e, "Failed to listen for Ctrl-C");
                }
                info!("Shutdown requested");
                break;
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *status.borrow_and_update();
                match client.error().map(ErrorResponse::from) {
                    Some(report) => warn!(
                        status = %current,
                        code = %report.code,
                        retryable = report.retryable,
                        "{}",
                        report.message
                    ),
                    None => info!(status = %current, "Sync status changed"),
                }
            }
            changed = presence.changed() => {
                if changed.is_err() {
                    break;
                }
                let users: Vec<String> = presence
                    .borrow_and_update()
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                info!(count = users.len(), users = ?users, "Presence changed");
            }
            event = cache_events.recv() => match event {
                Ok(event) => info!(event = ?event, entries = cache.len(), "Cache changed"),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Cache event stream lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    client.disconnect();
    info!("Sync watcher stopped");
    Ok(())
}
