pub mod commands;
pub mod core;
pub mod server;

use tracing_subscriber::EnvFilter;

use crate::core::error::NexusResult;
use crate::core::library::spawn_periodic_refresh;
use crate::core::paths::ServiceConfig;
use crate::core::state::AppState;

pub fn init_tracing() {
    // Initialize structured logging
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,savenexus_lib=debug")),
        )
        .try_init();
}

pub async fn run_from_env() -> NexusResult<()> {
    run(ServiceConfig::from_env()?).await
}

/// Scan once, start the refresh timer and the HTTP server, then serve until Ctrl-C.
pub async fn run(config: ServiceConfig) -> NexusResult<()> {
    tracing::info!("SaveNexus agent starting...");
    tracing::info!("SAVEDATA: {:?}", config.savedata_dir);
    tracing::info!("Save states: {:?}", config.savestate_dir);

    let state = AppState::from_config(&config);
    let initial = state.library.rescan().await;
    tracing::info!("Found {} games", initial.len());

    let refresher = config
        .refresh_interval
        .map(|every| spawn_periodic_refresh(state.library.clone(), every));

    let server = server::start(config.listen_addr, state).await?;

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl-C: {}", e);
    }
    tracing::info!("Shutting down");

    if let Some(handle) = refresher {
        handle.abort();
    }
    server.shutdown().await
}
