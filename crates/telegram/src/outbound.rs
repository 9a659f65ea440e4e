use {
    async_trait::async_trait,
    teloxide::{
        payloads::{SendAnimationSetters, SendMessageSetters, SendPhotoSetters},
        prelude::*,
        types::{ChatId, InputFile, ParseMode},
    },
    tracing::{info, warn},
};

use mqttgram_common::ChatOutbound;

use crate::{
    chunk::{TELEGRAM_MAX_MESSAGE_LEN, chunk_text},
    error::Result,
};

/// Outbound sender targeting the single configured destination chat.
pub struct TelegramOutbound {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramOutbound {
    #[must_use]
    pub fn new(bot: Bot, chat_id: i64) -> Self {
        Self {
            bot,
            chat_id: ChatId(chat_id),
        }
    }

    /// Send one chunk as Markdown, falling back to plain text when
    /// Telegram rejects the entity parse. The fallback's failure is the
    /// one that propagates.
    async fn send_chunk_with_fallback(&self, chunk: &str) -> Result<()> {
        match self
            .bot
            .send_message(self.chat_id, chunk)
            .parse_mode(ParseMode::Markdown)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(error = %e, "markdown send rejected, retrying as plain text");
                self.bot.send_message(self.chat_id, chunk).await?;
                Ok(())
            },
        }
    }
}

#[async_trait]
impl ChatOutbound for TelegramOutbound {
    async fn send_text(&self, text: &str) -> anyhow::Result<()> {
        let chunks = chunk_text(text, TELEGRAM_MAX_MESSAGE_LEN);
        for chunk in &chunks {
            self.send_chunk_with_fallback(chunk).await?;
        }
        info!(
            chat_id = self.chat_id.0,
            text_len = text.len(),
            chunk_count = chunks.len(),
            "text forwarded to chat"
        );
        Ok(())
    }

    async fn send_image(&self, bytes: Vec<u8>, filename: &str, caption: &str) -> anyhow::Result<()> {
        let input = InputFile::memory(bytes).file_name(filename.to_string());
        self.bot
            .send_photo(self.chat_id, input)
            .caption(caption)
            .await?;
        info!(chat_id = self.chat_id.0, filename, "image forwarded to chat");
        Ok(())
    }

    async fn send_animation(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        caption: &str,
    ) -> anyhow::Result<()> {
        let input = InputFile::memory(bytes).file_name(filename.to_string());
        self.bot
            .send_animation(self.chat_id, input)
            .caption(caption)
            .await?;
        info!(chat_id = self.chat_id.0, filename, "animation forwarded to chat");
        Ok(())
    }
}
