//! VERDICT API Server
//!
//! Binds the REST/WebSocket surface over an in-memory store backend.
//!
//! Environment variables:
//! - `VERDICT_API_BIND`: Host to bind (default: 0.0.0.0)
//! - `PORT` / `VERDICT_API_PORT`: Port to listen on (default: 3000)
//! - `RUST_LOG`: Log filter (default: info)
//! - plus the `VERDICT_*` variables read by [`ApiConfig::from_env`]

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use verdict_api::{create_api_router, ApiConfig, WsState};
use verdict_storage::InMemoryStore;

/// Resolve the bind address from the environment.
fn resolve_bind_addr() -> String {
    let host = std::env::var("VERDICT_API_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT")
        .or_else(|_| std::env::var("VERDICT_API_PORT"))
        .unwrap_or_else(|_| "3000".to_string());
    format!("{}:{}", host, port)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env();
    if config.is_production() {
        info!(origins = ?config.cors_origins, "CORS restricted to configured origins");
    } else {
        info!("CORS open (no origins configured)");
    }

    let store = Arc::new(InMemoryStore::new());
    let ws_state = Arc::new(WsState::new(config.ws_capacity));

    let app = create_api_router(
        &config,
        store.clone(),
        store.clone(),
        store.clone(),
        store,
        ws_state,
    );

    let addr = resolve_bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "VERDICT API listening");

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    Ok(())
}
