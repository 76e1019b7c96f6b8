//! docurag API server
//!
//! HTTP API and background ingestion worker pool for retrieval-augmented
//! chat over an ingested document library.

use std::net::SocketAddr;
use std::path::PathBuf;

use docurag_api::bootstrap;
use docurag_api::routes;
use docurag_config::ApplicationConfig;
use tracing::{error, info};

const DEFAULT_CONFIG_PATH: &str = "config/default.yaml";

fn config_path() -> PathBuf {
    std::env::var("DOCURAG_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[tokio::main]
async fn main() {
    docurag_common::initialize_environment();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "server exited with an error");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let path = config_path();
    info!(path = %path.display(), "loading configuration");
    let config = ApplicationConfig::load(&path)?;

    info!(port = config.api.port, "bootstrapping application state");
    let bootstrap::Bootstrapped { state, worker } = bootstrap::initialize_app_state(&config).await?;

    let app = routes::create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.api.host, config.api.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    tokio::select! {
        result = server => result.map_err(anyhow::Error::from),
        () = worker.run() => Ok(()),
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
