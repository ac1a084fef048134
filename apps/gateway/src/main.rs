use std::sync::Arc;

use anyhow::Result;
use axum::serve;
use relay_core::{FsConfigStore, HttpConverseClient};
use relay_gateway::config::GatewayConfig;
use relay_gateway::http::{GatewayState, build_router};
use relay_gateway::registry::AdapterRegistry;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = GatewayConfig::from_env()?;
    let http = reqwest::Client::new();
    let engine = HttpConverseClient::new(http.clone(), &config.converse_base)?;
    let store = Arc::new(FsConfigStore::new(config.config_root.clone()));
    let state = Arc::new(GatewayState {
        registry: AdapterRegistry::new(store, http),
        engine: Arc::new(engine),
        channel_tag: config.channel_tag.clone(),
    });

    let router = build_router(state);
    let listener = TcpListener::bind(config.addr).await?;
    info!("relay-gateway listening on {}", config.addr);

    serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
