// ABOUTME: Well-known intent, parameter and surface names shared by matcher, gears and tasks
// ABOUTME: Intents stay plain strings so new gears can claim names without touching this file

/// Repeat a message back to the caller.
pub mod echo {
    pub const INTENT: &str = "echo_message";
    pub const PARAM_MESSAGE: &str = "message";
}

/// Remember a song (title and author) somewhere persistent.
pub mod music {
    pub const INTENT: &str = "trace_music";
    pub const PARAM_TITLE: &str = "title";
    pub const PARAM_AUTHOR: &str = "author";
}

/// Current weather for a location.
pub mod weather {
    pub const INTENT: &str = "weather_forecast";
    pub const PARAM_LOCATION: &str = "location";
}

/// Deliver a text to a surface channel. The relay path is built on top of it.
pub mod send_message {
    pub const INTENT: &str = "send_message";
    pub const PARAM_SURFACE_ID: &str = "surface_id";
    pub const PARAM_CHANNEL_ID: &str = "channel_id";
    pub const PARAM_TEXT: &str = "text";
}

/// Tell the administrator about something.
pub mod notify_admin {
    pub const INTENT: &str = "notify_admin";
    pub const PARAM_MESSAGE: &str = "message";
}

/// Surface ids used by the default wiring.
pub mod surfaces {
    pub const NOTIFY_ADMIN: &str = "NotifyAdmin";
    pub const TELEGRAM_LURCH: &str = "Telegram-Lurch";
}
