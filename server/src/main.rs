use anyhow::Result;
use std::net::SocketAddr;
use tracing::info;

use tempo_relay::config::RelayConfig;
use tempo_relay::relay::RelayState;
use tempo_relay::routing;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tempo_relay=debug".parse()?)
                .add_directive("axum=info".parse()?),
        )
        .init();

    info!("Starting tempo relay");

    let config = RelayConfig::from_env()?;
    info!("Configuration loaded");

    let state = std::sync::Arc::new(RelayState::new(config.clone()));
    let app = routing::create_router(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    // Graceful shutdown signal (cross-platform)
    let shutdown_signal = async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutdown signal received, draining connections...");
    };

    info!("Relay listening on http://{}", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Relay stopped cleanly");
    Ok(())
}
