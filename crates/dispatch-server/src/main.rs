//! Dispatch Server - drone delivery planning backend

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dispatch_server::{api, config::Config, state::AppState};
use dispatch_upstream::IlpClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dispatch_server=debug".parse()?),
        )
        .init();

    tracing::info!("Starting Dispatch Server...");

    let config = Config::from_env();
    let port = config.server_port;

    // The upstream client is blocking; build it off the async workers.
    let endpoint = config.ilp_endpoint.clone();
    let upstream = tokio::task::spawn_blocking(move || IlpClient::new(&endpoint))
        .await
        .context("upstream client setup panicked")??;
    tracing::info!("Using drone data service at {}", upstream.base_url());

    let upstream = Arc::new(upstream);
    let state = Arc::new(AppState::new(
        upstream.clone(),
        upstream,
        config.planner.clone(),
    ));

    let app = api::routes()
        .with_state(state)
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
