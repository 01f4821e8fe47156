// Club Ledger - Web Server
// REST API with Axum over a SQLite store

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use club_ledger::{router, AppState, Database, Ledger, ServerConfig};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .with_target(false)
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("API shutting down...");
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = ServerConfig::from_env().context("Invalid configuration")?;

    // Schema is created on first open
    let db = Database::open(&config.db_path)?;
    let ledger = Arc::new(Ledger::new(db));

    let app = router(AppState::new(Arc::clone(&ledger)));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("API running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // The router (and its state clones) is gone once serve returns
    match Arc::try_unwrap(ledger) {
        Ok(ledger) => ledger.close()?,
        Err(_) => warn!("ledger still shared at shutdown; leaving the connection to drop"),
    }

    Ok(())
}
