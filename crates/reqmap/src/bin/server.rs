//! Requirement map server binary
//!
//! Run with: cargo run -p reqmap --bin reqmap-server -- --config reqmap.toml

use clap::Parser;
use reqmap::{config::ReqmapConfig, server::ReqmapServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "reqmap-server", version, about = "Clustered 2D maps of requirement texts")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "REQMAP_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reqmap=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = ReqmapConfig::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embeddings: {:?}", config.embeddings.backend);
    tracing::info!("  - Naming: {:?}", config.naming.backend);
    tracing::info!(
        "  - Density skipped above {} points",
        config.layout.clustering.skip_density_above
    );

    let server = ReqmapServer::from_config(config)?;

    println!("\nServer starting...");
    println!("  App: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /embed       - Lay out requirements");
    println!("  POST /api/layout  - Same as /embed");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
