//! Larder - Recipe Collection Server
//!
//! Extracts recipes from web pages with an LLM, stores them with embeddings
//! for semantic search, and keeps per-user collections.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use larder::{config, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = config::init();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "larder=debug,tower_http=debug".into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!(
        "Starting Larder server on {}:{}",
        config.server.host,
        config.server.port
    );

    let state = AppState::new(config).await?;
    tracing::info!("Application state initialized");

    let app = larder::app(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid listen address")?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
