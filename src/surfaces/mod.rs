// ABOUTME: Chat transports the butler can speak through
// ABOUTME: Telegram update parsing is always available, the Bot API surface sits behind a feature

#[cfg(feature = "telegram")]
pub mod telegram;
pub mod telegram_update;

#[cfg(feature = "telegram")]
pub use telegram::TelegramSurface;
pub use telegram_update::TelegramUpdate;
