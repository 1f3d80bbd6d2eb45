use std::{sync::Arc, time::Duration};

use {
    herald_bridge::Bridge,
    herald_channels::ChannelOutbound,
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand, UpdateKind},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use crate::{Error, Result, config::TelegramConfig, outbound::TelegramOutbound, text::parse_command};

/// Command that registers the current chat as a notification destination.
pub const REGISTER_COMMAND: &str = "gotify_register";

/// Build the bot with a client timeout longer than the long-poll timeout so
/// the HTTP client doesn't abort the request before Telegram responds.
pub fn build_bot(config: &TelegramConfig) -> Result<Bot> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(u64::from(config.poll_timeout_secs) + 15))
        .build()
        .map_err(|e| Error::message(format!("failed to build telegram http client: {e}")))?;
    Ok(Bot::with_client(config.token.expose_secret(), client))
}

/// Start polling for bot commands.
///
/// Verifies the token, clears any webhook and registers the command list,
/// then spawns a background task that processes updates until the returned
/// `CancellationToken` is cancelled.
pub async fn start_polling(
    config: TelegramConfig,
    bot: Bot,
    bridge: Arc<Bridge>,
) -> Result<CancellationToken> {
    let me = bot.get_me().await?;
    let bot_username = me.username.clone();

    // Delete any existing webhook so long polling works.
    bot.delete_webhook().send().await?;

    let commands = vec![BotCommand::new(
        REGISTER_COMMAND,
        "Send Gotify notifications to this chat",
    )];
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!(error = %e, "failed to register bot commands");
    }

    info!(username = ?bot_username, "telegram bot connected (webhook cleared)");

    let cancel = CancellationToken::new();
    let poll_cancel = cancel.clone();
    let outbound = TelegramOutbound::new(bot.clone());

    tokio::spawn(async move {
        info!("starting telegram polling loop");
        let mut offset: i32 = 0;

        loop {
            let result = tokio::select! {
                biased;
                () = poll_cancel.cancelled() => break,
                result = bot
                    .get_updates()
                    .offset(offset)
                    .timeout(config.poll_timeout_secs)
                    .allowed_updates(vec![AllowedUpdate::Message])
                    .send() => result,
            };

            match result {
                Ok(updates) => {
                    debug!(count = updates.len(), "got telegram updates");
                    for update in updates {
                        offset = update.id.as_offset();
                        match update.kind {
                            UpdateKind::Message(msg) => {
                                if let Err(e) = handle_message(
                                    &msg,
                                    bot_username.as_deref(),
                                    &bridge,
                                    &outbound,
                                )
                                .await
                                {
                                    error!(
                                        chat_id = msg.chat.id.0,
                                        error = %e,
                                        "error handling telegram message"
                                    );
                                }
                            },
                            other => {
                                debug!("ignoring non-message update: {other:?}");
                            },
                        }
                    }
                },
                Err(e) => {
                    if matches!(&e, RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) {
                        warn!(
                            "telegram polling disabled: another instance is already running with this token"
                        );
                        poll_cancel.cancel();
                        break;
                    }

                    warn!(error = %e, "telegram getUpdates failed");
                    tokio::select! {
                        () = poll_cancel.cancelled() => break,
                        () = tokio::time::sleep(Duration::from_secs(config.poll_error_backoff_secs)) => {},
                    }
                },
            }
        }
        info!("telegram polling stopped");
    });

    Ok(cancel)
}

/// Handle one incoming message. Returns `true` when it was the register
/// command; anything else is ignored.
pub(crate) async fn handle_message(
    msg: &Message,
    bot_username: Option<&str>,
    bridge: &Bridge,
    outbound: &TelegramOutbound,
) -> Result<bool> {
    let Some(text) = msg.text() else {
        return Ok(false);
    };
    if parse_command(text, REGISTER_COMMAND, bot_username).is_none() {
        return Ok(false);
    }

    let origin = msg.chat.id.0.to_string();
    let reply = match bridge.register_origin(&origin).await {
        Ok(ack) => ack,
        Err(e) => {
            error!(chat_id = %origin, error = %e, "failed to register chat");
            "❌ Could not register this chat, check the bridge logs.".to_string()
        },
    };
    outbound.send_text(&origin, &reply).await?;
    Ok(true)
}
