// ABOUTME: Minimal view of a Telegram webhook update
// ABOUTME: Turns updates into surface messages and authorization keys, anything unexpected yields None

use butler_core::SurfaceMessage;
use serde::Deserialize;

/// The parts of a Telegram `Update` the butler reads.
///
/// Everything is optional so unexpected payloads deserialize to "nothing to
/// do" instead of failing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelegramUpdate {
    #[serde(default)]
    pub update_id: Option<i64>,
    #[serde(default)]
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramMessage {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub chat: Option<TelegramChat>,
    #[serde(default)]
    pub from: Option<TelegramUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
}

impl TelegramUpdate {
    /// Parse a raw JSON update. Malformed updates become an empty update.
    pub fn from_json(value: serde_json::Value) -> Self {
        serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Unreadable Telegram update");
            Self::default()
        })
    }

    /// Text message as seen by the given surface, if the update carries one.
    pub fn to_surface_message(&self, surface_id: &str) -> Option<SurfaceMessage> {
        let message = self.message.as_ref()?;
        let text = message.text.as_deref()?;
        let chat = message.chat.as_ref()?;
        Some(SurfaceMessage::new(
            Some(surface_id),
            Some(chat.id.to_string()),
            Some(text),
        ))
    }

    /// The sender's user id, used as authorization key.
    pub fn auth_key(&self) -> Option<String> {
        let from = self.message.as_ref()?.from.as_ref()?;
        Some(from.id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_message_update() {
        let update = TelegramUpdate::from_json(json!({
            "update_id": 1,
            "message": {
                "message_id": 10,
                "text": "echo hi",
                "chat": { "id": 1234, "type": "private" },
                "from": { "id": 5678, "is_bot": false, "first_name": "Ann" }
            }
        }));

        let message = update.to_surface_message("Telegram-Lurch").unwrap();
        assert_eq!(message.surface_id(), Some("Telegram-Lurch"));
        assert_eq!(message.channel_id(), Some("1234"));
        assert_eq!(message.text(), Some("echo hi"));
        assert_eq!(update.auth_key().as_deref(), Some("5678"));
    }

    #[test]
    fn test_non_message_updates_yield_nothing() {
        let edited = TelegramUpdate::from_json(json!({
            "update_id": 2,
            "edited_message": { "text": "x", "chat": { "id": 1 } }
        }));
        assert!(edited.to_surface_message("tg").is_none());
        assert!(edited.auth_key().is_none());

        let sticker = TelegramUpdate::from_json(json!({
            "message": { "chat": { "id": 1 }, "from": { "id": 2 } }
        }));
        assert!(sticker.to_surface_message("tg").is_none());
        assert_eq!(sticker.auth_key().as_deref(), Some("2"));
    }

    #[test]
    fn test_wrong_types_yield_nothing() {
        let update = TelegramUpdate::from_json(json!({
            "message": { "text": "hi", "chat": { "id": "not a number" } }
        }));
        assert!(update.to_surface_message("tg").is_none());
        assert!(TelegramUpdate::from_json(json!("garbage")).message.is_none());
    }
}
