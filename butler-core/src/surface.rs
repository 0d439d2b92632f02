// ABOUTME: Surfaces are the channels the butler talks through (chat bots, admin notifications)
// ABOUTME: Defines the normalized SurfaceMessage, the Surface trait and the admin-notify adapter

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A message going to, or coming from, a surface.
///
/// Every field is normalized on construction: empty or whitespace-only values
/// become `None`, so callers can tell "nothing to send" from "empty text".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceMessage {
    surface_id: Option<String>,
    channel_id: Option<String>,
    text: Option<String>,
}

impl SurfaceMessage {
    pub fn new<S, C, T>(surface_id: Option<S>, channel_id: Option<C>, text: Option<T>) -> Self
    where
        S: Into<String>,
        C: Into<String>,
        T: Into<String>,
    {
        Self {
            surface_id: none_if_blank(surface_id.map(Into::into)),
            channel_id: none_if_blank(channel_id.map(Into::into)),
            text: none_if_blank(text.map(Into::into)),
        }
    }

    pub fn surface_id(&self) -> Option<&str> {
        self.surface_id.as_deref()
    }

    pub fn channel_id(&self) -> Option<&str> {
        self.channel_id.as_deref()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Whether there is any text worth sending.
    pub fn has_text(&self) -> bool {
        self.text.is_some()
    }
}

fn none_if_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Something able to deliver a [`SurfaceMessage`].
#[async_trait]
pub trait Surface: Send + Sync {
    /// Unique id the surface is registered under (e.g. "Telegram-Lurch").
    fn surface_id(&self) -> &str;

    /// Deliver the message. Messages without text are skipped and return
    /// `Ok(None)`. A surface may hand back a short acknowledgement text.
    async fn send_message(&self, message: &SurfaceMessage) -> Result<Option<String>>;
}

/// Sends notifications to a fixed administrator channel through another surface.
///
/// The wrapped surface does the actual delivery; this adapter only knows which
/// channel the administrator listens on and how to shape the message.
pub struct NotifyAdminSurface {
    surface_id: String,
    channel_id: String,
    inner: Arc<dyn Surface>,
}

impl NotifyAdminSurface {
    pub fn new(
        surface_id: impl Into<String>,
        channel_id: impl Into<String>,
        inner: Arc<dyn Surface>,
    ) -> Self {
        Self {
            surface_id: surface_id.into(),
            channel_id: channel_id.into(),
            inner,
        }
    }

    /// Build the message for the administrator channel.
    pub fn forge_notification(&self, text: &str) -> SurfaceMessage {
        SurfaceMessage::new(
            Some(self.surface_id.as_str()),
            Some(self.channel_id.as_str()),
            Some(text),
        )
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }
}

#[async_trait]
impl Surface for NotifyAdminSurface {
    fn surface_id(&self) -> &str {
        &self.surface_id
    }

    async fn send_message(&self, message: &SurfaceMessage) -> Result<Option<String>> {
        self.inner.send_message(message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields_become_none() {
        let msg = SurfaceMessage::new(Some(""), Some("   "), Some("\n\t"));
        assert_eq!(msg.surface_id(), None);
        assert_eq!(msg.channel_id(), None);
        assert_eq!(msg.text(), None);
        assert!(!msg.has_text());
    }

    #[test]
    fn test_values_are_kept_verbatim() {
        let msg = SurfaceMessage::new(Some("tg"), Some("42"), Some(" hello "));
        assert_eq!(msg.surface_id(), Some("tg"));
        assert_eq!(msg.channel_id(), Some("42"));
        assert_eq!(msg.text(), Some(" hello "));
    }

    #[test]
    fn test_absent_fields_stay_none() {
        let msg = SurfaceMessage::new(None::<String>, None::<String>, Some("hi"));
        assert_eq!(msg.surface_id(), None);
        assert_eq!(msg.channel_id(), None);
        assert!(msg.has_text());
    }
}
