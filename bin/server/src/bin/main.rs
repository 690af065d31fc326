use binding::Erc20Abi;
use clap::Parser;
use client::Connection;
use config::LogFormat;
use query::TokenService;
use server::{
    build_router,
    config::Cli,
    metrics::{install_prometheus_exporter, Metrics},
    AppState,
};
use std::{net::SocketAddr, sync::Arc};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }

    info!("Starting web3-search");
    info!("  RPC URL: {}", config.rpc_url);
    info!("  Request timeout: {:?}", config.request_timeout());

    if let Some(port) = config.metrics_port {
        install_prometheus_exporter(port)?;
        info!("Prometheus exporter listening on port {}", port);
    }

    let abi = Arc::new(Erc20Abi::load()?);
    let connection = Connection::open(&config.rpc_url).await?;
    let service = Arc::new(TokenService::new(connection, abi));

    let state = AppState::new(service.clone(), config.request_timeout(), Metrics::new());
    let router = build_router(state, config.cors);

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router and every in-flight request are gone once serve returns.
    match Arc::try_unwrap(service) {
        Ok(service) => service.into_caller().close(),
        Err(_) => warn!("Query service still shared at shutdown, connection dropped"),
    }

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
