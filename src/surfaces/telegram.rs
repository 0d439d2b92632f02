// ABOUTME: Telegram surface - delivers surface messages through the Bot API
// ABOUTME: Also registers the bot webhook at startup when it points elsewhere

use anyhow::{Context, Result};
use async_trait::async_trait;
use butler_core::{Surface, SurfaceMessage};
use teloxide::prelude::*;

pub struct TelegramSurface {
    surface_id: String,
    bot: Bot,
}

impl TelegramSurface {
    pub fn new(surface_id: impl Into<String>, bot_token: &str) -> Self {
        Self {
            surface_id: surface_id.into(),
            bot: Bot::new(bot_token),
        }
    }

    /// Point the bot webhook at `webhook_url`.
    ///
    /// Telegram rate-limits setWebhook, so the current registration is read
    /// first and left alone when it already matches.
    pub async fn register_webhook(&self, webhook_url: &str) -> Result<()> {
        let url = url::Url::parse(webhook_url)
            .with_context(|| format!("Invalid webhook url '{}'", webhook_url))?;

        let info = self
            .bot
            .get_webhook_info()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read Telegram webhook info: {}", e))?;
        if info.url.as_ref() == Some(&url) {
            tracing::info!(surface_id = %self.surface_id, url = %url, "Webhook already registered");
            return Ok(());
        }

        tracing::info!(surface_id = %self.surface_id, url = %url, "Registering Telegram webhook");
        self.bot
            .set_webhook(url)
            .max_connections(2)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to set Telegram webhook: {}", e))?;
        Ok(())
    }
}

#[async_trait]
impl Surface for TelegramSurface {
    fn surface_id(&self) -> &str {
        &self.surface_id
    }

    async fn send_message(&self, message: &SurfaceMessage) -> Result<Option<String>> {
        let Some(text) = message.text() else {
            return Ok(None);
        };
        let channel_id = message
            .channel_id()
            .context("Cannot send a Telegram message without a chat id")?;
        let chat_id = ChatId(
            channel_id
                .parse::<i64>()
                .map_err(|e| anyhow::anyhow!("Invalid Telegram chat ID '{}': {}", channel_id, e))?,
        );

        self.bot
            .send_message(chat_id, text)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send Telegram message: {}", e))?;

        tracing::debug!(surface_id = %self.surface_id, chat_id = %channel_id, "Telegram message sent");
        Ok(None)
    }
}
