//! Telegram transport for herald.
//!
//! [`TelegramOutbound`] delivers notification text to chat ids, and
//! [`start_polling`] answers the `/gotify_register` command so a chat can
//! subscribe itself.

pub mod bot;
pub mod config;
pub mod error;
pub mod outbound;
pub mod text;

pub use {
    bot::{REGISTER_COMMAND, build_bot, start_polling},
    config::TelegramConfig,
    error::{Error, Result},
    outbound::{TelegramOutbound, parse_chat_id},
};
