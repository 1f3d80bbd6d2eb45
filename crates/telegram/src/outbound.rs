use std::{future::Future, time::Duration};

use {
    async_trait::async_trait,
    herald_channels::{ChannelHealthSnapshot, ChannelOutbound, ChannelStatus, Error as ChannelError},
    teloxide::{RequestError, prelude::*, types::ChatId},
    tracing::{debug, info, warn},
};

use crate::text::{TELEGRAM_MAX_MESSAGE_LEN, chunk_message};

const TELEGRAM_RETRY_AFTER_MAX_RETRIES: usize = 4;

/// Sends notification text to Telegram chats. Destinations are chat ids.
#[derive(Clone)]
pub struct TelegramOutbound {
    bot: Bot,
}

impl TelegramOutbound {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    async fn run_telegram_request_with_retry<T, F, Fut>(
        &self,
        to: &str,
        operation: &'static str,
        mut request: F,
    ) -> Result<T, RequestError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RequestError>>,
    {
        let mut retries = 0usize;

        loop {
            match request().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let Some(wait) = retry_after_duration(&err) else {
                        return Err(err);
                    };

                    if retries >= TELEGRAM_RETRY_AFTER_MAX_RETRIES {
                        warn!(
                            chat_id = to,
                            operation,
                            retries,
                            retry_after_secs = wait.as_secs(),
                            "telegram rate limit persisted after retries"
                        );
                        return Err(err);
                    }

                    retries += 1;
                    warn!(
                        chat_id = to,
                        operation,
                        retries,
                        max_retries = TELEGRAM_RETRY_AFTER_MAX_RETRIES,
                        retry_after_secs = wait.as_secs(),
                        "telegram rate limited, waiting before retry"
                    );
                    tokio::time::sleep(wait).await;
                },
            }
        }
    }
}

/// Parse a destination string into a Telegram chat id.
pub fn parse_chat_id(to: &str) -> herald_channels::Result<ChatId> {
    to.trim()
        .parse::<i64>()
        .map(ChatId)
        .map_err(|_| ChannelError::invalid_input(format!("not a telegram chat id: {to:?}")))
}

fn retry_after_duration(error: &RequestError) -> Option<Duration> {
    match error {
        RequestError::RetryAfter(wait) => Some(wait.duration()),
        _ => None,
    }
}

#[async_trait]
impl ChannelOutbound for TelegramOutbound {
    async fn send_text(&self, to: &str, text: &str) -> herald_channels::Result<()> {
        let chat_id = parse_chat_id(to)?;
        let chunks = chunk_message(text, TELEGRAM_MAX_MESSAGE_LEN);
        debug!(
            chat_id = to,
            text_len = text.len(),
            chunk_count = chunks.len(),
            "telegram outbound text send start"
        );

        for chunk in &chunks {
            // Plain text: notification bodies are arbitrary and must not be
            // interpreted as markup.
            self.run_telegram_request_with_retry(to, "send message", || {
                let req = self.bot.send_message(chat_id, chunk);
                async move { req.await }
            })
            .await
            .map_err(|e| ChannelError::external("telegram send message", e))?;
        }

        info!(
            chat_id = to,
            chunk_count = chunks.len(),
            "telegram outbound text sent"
        );
        Ok(())
    }
}

#[async_trait]
impl ChannelStatus for TelegramOutbound {
    async fn probe(&self) -> herald_channels::Result<ChannelHealthSnapshot> {
        match self.bot.get_me().await {
            Ok(me) => Ok(ChannelHealthSnapshot {
                channel_type: "telegram".into(),
                connected: true,
                details: me.username.clone().map(|u| format!("Bot: @{u}")),
            }),
            Err(e) => Ok(ChannelHealthSnapshot {
                channel_type: "telegram".into(),
                connected: false,
                details: Some(format!("API error: {e}")),
            }),
        }
    }
}
