// ABOUTME: Configuration parsing from TOML file with environment variable overrides
// ABOUTME: Validates required fields and provides sensible defaults for optional ones
use crate::paths;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram: Option<TelegramConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify_admin: Option<NotifyAdminConfig>,
    #[serde(default)]
    pub gears: GearsConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

// ─── ServerConfig ───────────────────────────────────────────────

#[derive(Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Shared secrets accepted in the X-Authorization header. Telegram user
    /// ids listed here may also talk to the bot.
    #[serde(default)]
    pub authorized_keys: Vec<String>,
}

// Custom Debug impl to redact authorized_keys
impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field(
                "authorized_keys",
                &format!("[REDACTED; {}]", self.authorized_keys.len()),
            )
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            authorized_keys: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

// ─── TelegramConfig ─────────────────────────────────────────────

#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    #[serde(default = "default_telegram_surface_id")]
    pub surface_id: String,
    /// Public URL Telegram should push updates to. Registered at startup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

// Custom Debug impl to redact bot_token
impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"[REDACTED]")
            .field("surface_id", &self.surface_id)
            .field("webhook_url", &self.webhook_url)
            .finish()
    }
}

fn default_telegram_surface_id() -> String {
    butler_core::intents::surfaces::TELEGRAM_LURCH.to_string()
}

// ─── NotifyAdminConfig ──────────────────────────────────────────

#[derive(Clone, Serialize, Deserialize)]
pub struct NotifyAdminConfig {
    /// Bot used for admin notifications. Falls back to the main Telegram bot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,
    pub chat_id: String,
}

// Custom Debug impl to redact bot_token
impl std::fmt::Debug for NotifyAdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyAdminConfig")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "[REDACTED]"))
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

// ─── GearsConfig ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GearsConfig {
    /// Where trace_music posts songs. The music gear is off when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music_destination_url: Option<String>,
    #[serde(default = "default_weather_base_url")]
    pub weather_base_url: String,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

impl Default for GearsConfig {
    fn default() -> Self {
        Self {
            music_destination_url: None,
            weather_base_url: default_weather_base_url(),
            http_timeout_secs: default_http_timeout_secs(),
        }
    }
}

fn default_weather_base_url() -> String {
    "https://wttr.in".to_string()
}

fn default_http_timeout_secs() -> u64 {
    10
}

// ─── SchedulerConfig ────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// TOML file with `[[tasks]]` entries. Defaults to tasks.toml in the config dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks_file: Option<String>,
    /// Run due tasks from an in-process hourly ticker instead of relying on
    /// an external trigger calling the tick endpoint.
    #[serde(default)]
    pub run_ticker: bool,
}

/// Expand tilde (~) to home directory in paths
fn expand_tilde(path: &str) -> String {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(base_dirs) = directories::BaseDirs::new() {
            return base_dirs
                .home_dir()
                .join(stripped)
                .to_string_lossy()
                .to_string();
        }
        tracing::warn!(
            path = %path,
            "Failed to expand tilde in path: could not determine home directory"
        );
    }
    path.to_string()
}

impl Config {
    /// Find the config file, checking multiple locations in order:
    /// 1. BUTLER_CONFIG_PATH env var (if set)
    /// 2. ./config.toml (current directory - for development)
    /// 3. ~/.config/butler/config.toml (XDG config dir)
    fn find_config_file() -> Option<PathBuf> {
        if let Ok(env_path) = std::env::var("BUTLER_CONFIG_PATH") {
            let path = PathBuf::from(&env_path);
            if path.exists() {
                return Some(path);
            }
        }

        let local_config = PathBuf::from("config.toml");
        if local_config.exists() {
            return Some(local_config);
        }

        let xdg_config = paths::config_file();
        if xdg_config.exists() {
            return Some(xdg_config);
        }

        None
    }

    /// Load configuration, searching the usual locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration from `path` when given, otherwise from the first
    /// file found by the usual search. Environment variables win over the file.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::find_config_file(),
        };

        let mut config = if let Some(config_path) = config_path {
            tracing::info!(
                path = %config_path.display(),
                "Loading configuration from file"
            );
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            toml::from_str::<Config>(&content)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?
        } else {
            tracing::info!("No config file found, using environment variables and defaults");
            Config::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(val) = env_value("BUTLER_HOST") {
            self.server.host = val;
        }
        if let Some(val) = env_value("BUTLER_PORT") {
            self.server.port = val.parse().with_context(|| {
                format!("BUTLER_PORT must be a valid port number, got: {}", val)
            })?;
        }
        if let Some(val) = env_value("BUTLER_AUTHORIZED_KEYS") {
            self.server.authorized_keys = split_list(&val);
        }
        if let Some(val) = env_value("TELEGRAM_BOT_TOKEN") {
            match self.telegram {
                Some(ref mut telegram) => telegram.bot_token = val,
                None => {
                    self.telegram = Some(TelegramConfig {
                        bot_token: val,
                        surface_id: default_telegram_surface_id(),
                        webhook_url: None,
                    })
                }
            }
        }
        if let Some(val) = env_value("TELEGRAM_WEBHOOK_URL") {
            if let Some(ref mut telegram) = self.telegram {
                telegram.webhook_url = Some(val);
            }
        }
        if let Some(val) = env_value("NOTIFY_ADMIN_CHAT_ID") {
            match self.notify_admin {
                Some(ref mut admin) => admin.chat_id = val,
                None => {
                    self.notify_admin = Some(NotifyAdminConfig {
                        bot_token: None,
                        chat_id: val,
                    })
                }
            }
        }
        if let Some(val) = env_value("NOTIFY_ADMIN_BOT_TOKEN") {
            if let Some(ref mut admin) = self.notify_admin {
                admin.bot_token = Some(val);
            }
        }
        if let Some(val) = env_value("MUSIC_DESTINATION_URL") {
            self.gears.music_destination_url = Some(val);
        }
        if let Some(val) = env_value("BUTLER_TASKS_FILE") {
            self.scheduler.tasks_file = Some(val);
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        self.server.authorized_keys.retain(|k| !k.trim().is_empty());
        if self.server.authorized_keys.is_empty() {
            tracing::warn!("server.authorized_keys is empty, every API request will be refused");
        }

        if let Some(ref mut telegram) = self.telegram {
            if telegram.bot_token.trim().is_empty() {
                anyhow::bail!(
                    "telegram.bot_token is required (set in config.toml or TELEGRAM_BOT_TOKEN env var)"
                );
            }
            if telegram
                .webhook_url
                .as_deref()
                .is_some_and(|u| u.trim().is_empty())
            {
                telegram.webhook_url = None;
            }
            if let Some(ref url) = telegram.webhook_url {
                url::Url::parse(url)
                    .with_context(|| format!("Invalid telegram.webhook_url '{}'", url))?;
            }
        }

        if let Some(ref admin) = self.notify_admin {
            if admin.chat_id.trim().is_empty() {
                anyhow::bail!(
                    "notify_admin.chat_id is required (set in config.toml or NOTIFY_ADMIN_CHAT_ID env var)"
                );
            }
            let has_token = admin
                .bot_token
                .as_deref()
                .is_some_and(|t| !t.trim().is_empty())
                || self.telegram.is_some();
            if !has_token {
                anyhow::bail!("notify_admin needs a bot_token or a [telegram] section to send through");
            }
        }

        if let Some(ref url) = self.gears.music_destination_url {
            url::Url::parse(url)
                .with_context(|| format!("Invalid gears.music_destination_url '{}'", url))?;
        }
        url::Url::parse(&self.gears.weather_base_url).with_context(|| {
            format!(
                "Invalid gears.weather_base_url '{}'",
                self.gears.weather_base_url
            )
        })?;

        if let Some(tasks_file) = self.scheduler.tasks_file.take() {
            self.scheduler.tasks_file = Some(expand_tilde(&tasks_file));
        }

        Ok(())
    }

    /// Tasks file to load: the configured one or the default in the config dir
    pub fn tasks_path(&self) -> PathBuf {
        self.scheduler
            .tasks_file
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(paths::tasks_file)
    }

    pub fn is_key_authorized(&self, key: &str) -> bool {
        !key.is_empty() && self.server.authorized_keys.iter().any(|k| k == key)
    }
}

/// Value of an environment variable, with blank values treated as unset
fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_drops_blanks() {
        assert_eq!(split_list(" a, ,b ,,"), vec!["a", "b"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config {
            server: ServerConfig {
                authorized_keys: vec!["super-secret".to_string()],
                ..ServerConfig::default()
            },
            telegram: Some(TelegramConfig {
                bot_token: "123:token".to_string(),
                surface_id: default_telegram_surface_id(),
                webhook_url: None,
            }),
            notify_admin: Some(NotifyAdminConfig {
                bot_token: Some("456:admin".to_string()),
                chat_id: "42".to_string(),
            }),
            ..Config::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("123:token"));
        assert!(!debug.contains("456:admin"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_empty_key_is_never_authorized() {
        let mut config = Config::default();
        config.server.authorized_keys = vec!["key".to_string()];
        assert!(config.is_key_authorized("key"));
        assert!(!config.is_key_authorized(""));
        assert!(!config.is_key_authorized("KEY"));
    }
}
