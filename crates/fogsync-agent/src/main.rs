use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use fogsync_controller::Controller;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Gateway agent keeping the local process engine and the cloud
/// controller in sync.
#[derive(Parser)]
#[command(name = "fogsync", version)]
struct Cli {
    /// Configuration file.
    #[arg(long, default_value = "config.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = fogsync_config::load(&cli.config)?;

    let cancel = CancellationToken::new();
    Controller::start(config, cancel.clone()).await?;

    wait_for_shutdown(&cancel).await?;
    cancel.cancel();
    // drain window: let the broker session and listeners close cleanly
    tokio::time::sleep(Duration::from_secs(1)).await;
    Ok(())
}

async fn wait_for_shutdown(cancel: &CancellationToken) -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("received interrupt signal"),
            _ = terminate.recv() => info!("received terminate signal"),
            _ = cancel.cancelled() => info!("shutting down after fatal error"),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("received interrupt signal"),
            _ = cancel.cancelled() => info!("shutting down after fatal error"),
        }
    }
    Ok(())
}
