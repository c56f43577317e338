//! LCI dashboard: influencer campaign analytics service.
//!
//! Main entry point that wires the document store, snapshot loader, mailer
//! and HTTP API together.

use clap::Parser;
use lci_api::ApiServer;
use lci_channels::LogMailer;
use lci_core::config::AppConfig;
use lci_management::{ManagementStore, SnapshotLoader};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "lci-dashboard")]
#[command(about = "Influencer campaign analytics dashboard")]
#[command(version)]
struct Cli {
    /// HTTP port (overrides config)
    #[arg(long, env = "LCI__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Metrics port (overrides config)
    #[arg(long, env = "LCI__METRICS__PORT")]
    metrics_port: Option<u16>,

    /// Start with an empty store
    #[arg(long, default_value_t = false)]
    no_seed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lci_dashboard=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("LCI dashboard starting up");

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(port) = cli.metrics_port {
        config.metrics.port = port;
    }
    if cli.no_seed {
        config.seed_demo_data = false;
    }

    info!(
        http_port = config.api.http_port,
        metrics_port = config.metrics.port,
        seed_demo_data = config.seed_demo_data,
        email_enabled = config.email.enabled,
        "Configuration loaded"
    );

    let store = Arc::new(if config.seed_demo_data {
        ManagementStore::with_demo_data()
    } else {
        ManagementStore::new()
    });

    let loader = Arc::new(SnapshotLoader::new(store.clone()));
    if let Some(snapshot) = loader.refresh().await {
        info!(posts = snapshot.posts.len(), "Initial snapshot loaded");
    }

    let api_server = ApiServer::new(config, store, loader, Arc::new(LogMailer::new()));

    if let Err(e) = api_server.start_metrics().await {
        error!(error = %e, "Failed to start metrics exporter");
    }

    info!("LCI dashboard is ready to serve traffic");

    api_server.start_http().await?;

    Ok(())
}
