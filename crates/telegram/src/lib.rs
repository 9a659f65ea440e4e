//! Telegram side of the bridge.
//!
//! Wraps teloxide for outbound delivery (chunked text with a plain-text
//! fallback, photo and animation attachments) and runs the inbound
//! long-poll loop that forwards authorized chat messages to the broker.

pub mod access;
pub mod bot;
pub mod chunk;
pub mod error;
pub mod outbound;

pub use {
    bot::{ChatListener, build_bot},
    error::{Error, Result},
    outbound::TelegramOutbound,
    teloxide::Bot,
};
