//! HTTP query API.
//!
//! Validates identity-lookup requests, runs them as chat commands against the
//! configured responders, and serves the files those responders sent back.

mod config;
mod error;
mod routes;
mod state;

use std::sync::Arc;

use query_engine::{LocalObjectStore, QueryOrchestrator};
use signal_transport::{SignalTransport, TransportConfig};
use tracing::info;

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    info!(
        addr = %config.addr,
        primary = %config.engine.primary.identity,
        backup = %config.engine.backup.identity,
        "Starting query API"
    );

    let mut transport_config =
        TransportConfig::with_account(&config.signal_daemon_url, &config.signal_account);
    if let Some(dir) = &config.signal_attachments_dir {
        transport_config = transport_config.with_attachments_dir(dir);
    }
    let transport = Arc::new(SignalTransport::new(transport_config)?);

    tokio::fs::create_dir_all(&config.download_dir).await?;
    let store = Arc::new(LocalObjectStore::new(&config.download_dir));

    let orchestrator = QueryOrchestrator::new(config.engine.clone(), transport, store);
    let state = AppState::new(Arc::new(orchestrator));

    let app = routes::app(state, &config.download_dir);

    info!(addr = %config.addr, "Query API listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
