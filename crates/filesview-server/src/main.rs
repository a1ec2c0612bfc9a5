//! filesview server binary
//!
//! ## Usage
//!
//! ```bash
//! # Serve /var/log as "logs" on the default address
//! filesview-server --attach /var/log=logs
//!
//! # Load bind address and attachments from a RON file
//! filesview-server --config ~/.config/filesview/server.ron
//! ```

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use filesview_kernel::Files;
use filesview_server::{Cli, ServerConfig, serve};
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Server error: {:#}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ServerConfig::from_cli(&cli)?;

    let files = Files::new();
    for attachment in &config.attach {
        let path = attachment.expanded_path();
        files
            .attach(&path, &attachment.name)
            .await
            .with_context(|| format!("failed to attach {} as '{}'", path.display(), attachment.name))?;
    }

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!("listening on: {}", listener.local_addr()?);

    serve(listener, files, shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(?err, "Failed to setup graceful shutdown handler");
        std::future::pending::<()>().await;
    }
}
