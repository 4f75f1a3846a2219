//! vitrine-server: HTTP pages, catalog service, and server lifecycle.
//!
//! Ties the database, media and config crates together into a running
//! server:
//!
//! - [`catalog::CatalogService`] sequences image processing and persistence
//! - Axum routes render the catalog pages and accept multipart forms
//! - Stored uploads are served from `/uploads`
//! - Graceful shutdown via signal handling

pub mod catalog;
pub mod context;
pub mod error;
pub mod form;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod views;

use std::net::SocketAddr;

use tokio::signal;
use vitrine_core::config::Config;

use crate::context::AppContext;

/// Start the vitrine server.
///
/// Opens the database and uploads directory, binds the listener and serves
/// until a shutdown signal is received.
pub async fn start(config: Config) -> vitrine_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| vitrine_core::Error::Internal(format!("Invalid server address: {e}")))?;

    let ctx = AppContext::open(config)?;
    let app = router::build_router(ctx);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| vitrine_core::Error::Internal(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
