use {herald_channels::DestinationRegistry, tracing::info};

use crate::Result;

/// Register `origin` (the chat a command came from) as a destination.
///
/// Returns the acknowledgement to send back to the origin. Registering an
/// existing destination is not an error.
pub async fn register_origin(registry: &DestinationRegistry, origin: &str) -> Result<String> {
    let origin = origin.trim();
    if origin.is_empty() {
        return Err(herald_channels::Error::invalid_input("origin must not be empty").into());
    }
    info!(origin, "register command received");

    let inserted = registry.add(origin).await?;
    let destinations = registry.list();
    info!(?destinations, "destinations updated");

    Ok(if inserted {
        "✅ This chat will now receive Gotify notifications.".to_string()
    } else {
        "ℹ️ This chat is already registered for Gotify notifications.".to_string()
    })
}
