use std::{path::Path, sync::Arc};

use {
    anyhow::{Context, Result, bail},
    herald_bridge::{Bridge, BridgeSettings, ConfigDestinationStore, register_origin},
    herald_channels::DestinationRegistry,
    herald_gotify::GotifyClient,
    herald_telegram::{TelegramConfig, TelegramOutbound, build_bot, start_polling},
    tracing::{info, warn},
};

/// Run the bridge until Ctrl-C.
pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let (config, path) = crate::load_config(config_path)?;

    if config.gotify.server.trim().is_empty() {
        bail!("gotify.server is not configured (see `herald check`)");
    }
    if !config.gotify.has_token() {
        bail!("gotify.token is not configured (see `herald check`)");
    }
    let telegram = config
        .channels
        .telegram
        .clone()
        .context("channels.telegram is not configured")?;
    let telegram = TelegramConfig::from_value(telegram)?;

    let source = GotifyClient::new(&config.gotify.server, config.gotify.token.clone())?;
    let bot = build_bot(&telegram)?;
    let outbound = TelegramOutbound::new(bot.clone());

    let bridge = Arc::new(Bridge::new(
        Arc::new(source),
        Arc::new(outbound),
        Arc::new(ConfigDestinationStore::new(&path)),
        BridgeSettings::from_config(&config),
    ));

    info!(
        server = %config.gotify.server,
        applications = ?config.applications,
        destinations = config.destinations.len(),
        config = %path.display(),
        "starting gotify bridge"
    );
    bridge.initialize().await;

    let polling = match start_polling(telegram, bot, Arc::clone(&bridge)).await {
        Ok(cancel) => Some(cancel),
        Err(e) => {
            warn!(error = %e, "telegram commands unavailable, /gotify_register will not work");
            None
        },
    };

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("shutdown requested");

    if let Some(cancel) = polling {
        cancel.cancel();
    }
    bridge.terminate().await;
    Ok(())
}

/// Register a destination straight into the config file.
pub async fn register(config_path: Option<&Path>, destination: &str) -> Result<()> {
    let (config, path) = crate::load_config(config_path)?;
    let registry = DestinationRegistry::new(
        config.destinations,
        Arc::new(ConfigDestinationStore::new(&path)),
    );

    let ack = register_origin(&registry, destination).await?;
    println!("{ack}");
    println!("Destinations saved to {}:", path.display());
    for d in registry.list() {
        println!("  {d}");
    }
    Ok(())
}
