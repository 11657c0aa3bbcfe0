//! Palaver - IRC <-> messenger relay bridge
//!
//! Keeps one IRC connection and a pool of messenger accounts online and
//! relays messages between IRC channels and messenger groups, plus
//! directed private messages in both directions.

mod bridge;
mod common;
mod config;
mod irc;
mod messenger;
mod protocol;

use anyhow::Result;
use tokio::signal;
use tracing::{error, info};

use bridge::Bridge;
use config::{env::get_config_path, load_and_validate, write_backup};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Palaver v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let loaded = load_and_validate(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!("Please ensure {} exists and is properly formatted.", config_path);
        error!("See palaver.example.json for reference.");
        e
    })?;

    let backup = write_backup(&config_path, &loaded.raw)?;
    info!("Configuration backed up to {}", backup.display());

    let config = loaded.config;
    info!("Configuration loaded successfully");
    info!("  IRC: {}:{} as {}", config.irc.server, config.irc.port, config.irc.nick);
    info!("  Owner: {}", config.irc.owner_nick);
    info!("  Gateway: {}", config.messenger.gateway);
    info!("  Accounts: {}", config.messenger.accounts.len());
    info!("  Contacts: {}", config.contacts.len());

    let bridge = Bridge::from_config(&config)?;

    if let Err(e) = bridge.run(shutdown_signal()).await {
        error!("Bridge failed to start: {}", e);
        return Err(e.into());
    }

    info!("Exiting...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
