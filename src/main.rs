use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leaderboard_engine::clock::SystemClock;
use leaderboard_engine::config::EngineConfig;
use leaderboard_engine::orders::InMemoryOrderRepository;
use leaderboard_engine::server::{AppState, build_router};
use leaderboard_engine::store::MemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leaderboard_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EngineConfig::from_env();
    tracing::info!(
        key_prefix = %config.key_prefix,
        dedup_ttl_secs = config.dedup_ttl.as_secs(),
        claim_ttl_secs = config.claim_ttl.as_secs(),
        store_timeout = ?config.store_timeout,
        "Loaded configuration"
    );

    let clock = Arc::new(SystemClock);
    let store = MemoryStore::new(clock.clone());
    let state = AppState::new(
        store,
        &config,
        clock,
        Arc::new(InMemoryOrderRepository::new()),
    );
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
