//! Portfolio Analytics HTTP Server
//!
//! Axum service exposing the analytics kernel (rebalancing, risk metrics,
//! market analysis) and the market indicators kept fresh by the background
//! data collector.

mod config;
mod error;
mod extract;
mod handlers;
mod monitor;
mod routes;
mod state;

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crypto_analytics::{CoinGeckoFeed, DataCollector, MarketDataCollector, PortfolioAnalyzer};

use crate::config::{ServerConfig, CLIENT_TIMEOUT};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env();

    // Market data collector
    let feed = Arc::new(CoinGeckoFeed::with_timeout(config.price_api_url.clone(), CLIENT_TIMEOUT)?);
    let collector = Arc::new(DataCollector::new(feed, config.collector()));
    collector.start().await?;

    let engine = Arc::new(PortfolioAnalyzer::default());
    let state = AppState::new(engine, collector.clone());
    let app = build_router(state, &config);

    // Start server
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Portfolio analytics server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                 - Health check");
    tracing::info!("  GET  /api/market-indicators  - Market indicators");
    tracing::info!("  POST /api/optimize-portfolio - Rebalance recommendation");
    tracing::info!("  POST /api/risk-metrics       - Portfolio risk metrics");
    tracing::info!("  POST /api/market-analysis    - Token market analysis");

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
    });

    tokio::select! {
        () = shutdown_signal() => {
            tracing::info!("Shutdown signal received, draining connections");
        }
        result = &mut server => {
            collector.stop().await?;
            result??;
            anyhow::bail!("server exited unexpectedly");
        }
    }

    let _ = shutdown_tx.send(());
    match tokio::time::timeout(config.shutdown_grace, &mut server).await {
        Ok(Ok(Ok(()))) => tracing::info!("HTTP server stopped"),
        Ok(Ok(Err(e))) => tracing::error!(error = %e, "HTTP server error during shutdown"),
        Ok(Err(e)) => tracing::error!(error = %e, "HTTP server task failed"),
        Err(_) => {
            tracing::warn!(
                grace_secs = config.shutdown_grace.as_secs(),
                "In-flight requests did not finish in time, aborting"
            );
            server.abort();
        }
    }

    collector.stop().await?;
    tracing::info!("Shutdown complete");

    Ok(())
}

/// Resolves on SIGINT, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
