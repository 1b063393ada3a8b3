use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use crate::api;
use crate::config::Config;
use crate::state::SharedState;

pub async fn cmd_daemon(config: Config) -> anyhow::Result<()> {
    info!("Gaps v{} starting in daemon mode...", env!("CARGO_PKG_VERSION"));

    let server = config.server.clone();
    let shared = Arc::new(SharedState::new(config)?);
    let state = api::create_app_state(Arc::clone(&shared));

    let server_handle: Option<tokio::task::JoinHandle<()>> = if server.enabled {
        let port = server.port;
        info!("Starting Web API on port {}", port);

        let app = api::router(state).await;
        let addr = format!("0.0.0.0:{}", port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        Some(tokio::spawn(async move {
            info!("Web Server running at http://0.0.0.0:{}", port);
            if let Err(e) = axum::serve(listener, app).await {
                error!("Web server error: {}", e);
            }
        }))
    } else {
        info!("Web API disabled, nothing to do besides waiting for Ctrl+C");
        None
    };

    info!("Daemon running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    if shared.supervisor.cancel().await.is_ok() {
        info!("Cancelled the running search");
    }
    if let Some(handle) = server_handle {
        handle.abort();
    }
    info!("Daemon stopped");

    Ok(())
}
