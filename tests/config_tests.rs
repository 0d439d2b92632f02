// ABOUTME: Tests for configuration loading and validation
// ABOUTME: Verifies TOML parsing, env var overrides, and required field validation

use serial_test::serial;
use std::io::Write;
use std::path::PathBuf;

const CONFIG_ENV_VARS: &[&str] = &[
    "BUTLER_CONFIG_PATH",
    "BUTLER_HOST",
    "BUTLER_PORT",
    "BUTLER_AUTHORIZED_KEYS",
    "BUTLER_TASKS_FILE",
    "TELEGRAM_BOT_TOKEN",
    "TELEGRAM_WEBHOOK_URL",
    "NOTIFY_ADMIN_CHAT_ID",
    "NOTIFY_ADMIN_BOT_TOKEN",
    "MUSIC_DESTINATION_URL",
];

/// Helper to clear all config-related env vars
fn clear_config_env_vars() {
    for var in CONFIG_ENV_VARS {
        std::env::remove_var(var);
    }
}

/// Write `content` to a config.toml inside a fresh temp dir.
/// The dir must outlive the test body.
fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    (dir, path)
}

#[test]
#[serial]
fn test_config_loads_from_toml_file() {
    clear_config_env_vars();

    let (_dir, path) = write_config(
        r#"
[server]
host = "0.0.0.0"
port = 8080
authorized_keys = ["alpha", "beta"]

[telegram]
bot_token = "123:abc"
webhook_url = "https://butler.example.com/butler/telegramwebhook/v1.0"

[notify_admin]
chat_id = "42"

[gears]
music_destination_url = "https://script.example.com/exec"
http_timeout_secs = 3

[scheduler]
tasks_file = "/etc/butler/tasks.toml"
run_ticker = true
"#,
    );
    std::env::set_var("BUTLER_CONFIG_PATH", &path);

    let config = butler::config::Config::load().unwrap();

    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.authorized_keys, vec!["alpha", "beta"]);

    let telegram = config.telegram.as_ref().unwrap();
    assert_eq!(telegram.bot_token, "123:abc");
    assert_eq!(telegram.surface_id, "Telegram-Lurch");
    assert!(telegram.webhook_url.is_some());

    let admin = config.notify_admin.as_ref().unwrap();
    assert_eq!(admin.chat_id, "42");
    assert!(admin.bot_token.is_none());

    assert_eq!(
        config.gears.music_destination_url.as_deref(),
        Some("https://script.example.com/exec")
    );
    assert_eq!(config.gears.weather_base_url, "https://wttr.in");
    assert_eq!(config.gears.http_timeout_secs, 3);
    assert!(config.scheduler.run_ticker);
    assert_eq!(config.tasks_path(), PathBuf::from("/etc/butler/tasks.toml"));

    clear_config_env_vars();
}

#[test]
#[serial]
fn test_config_env_var_overrides() {
    clear_config_env_vars();

    let (_dir, path) = write_config(
        r#"
[server]
port = 8080
authorized_keys = ["from-file"]

[telegram]
bot_token = "from-file"
"#,
    );
    std::env::set_var("BUTLER_CONFIG_PATH", &path);
    std::env::set_var("BUTLER_PORT", "9090");
    std::env::set_var("BUTLER_AUTHORIZED_KEYS", "one, two,,");
    std::env::set_var("TELEGRAM_BOT_TOKEN", "from-env");
    std::env::set_var("MUSIC_DESTINATION_URL", "http://localhost:3000/songs");

    let config = butler::config::Config::load().unwrap();

    assert_eq!(config.server.port, 9090);
    assert_eq!(config.server.authorized_keys, vec!["one", "two"]);
    assert_eq!(config.telegram.unwrap().bot_token, "from-env");
    assert_eq!(
        config.gears.music_destination_url.as_deref(),
        Some("http://localhost:3000/songs")
    );

    clear_config_env_vars();
}

#[test]
#[serial]
fn test_config_sections_from_env_only() {
    clear_config_env_vars();

    let (_dir, path) = write_config("");
    std::env::set_var("BUTLER_CONFIG_PATH", &path);
    std::env::set_var("TELEGRAM_BOT_TOKEN", "123:env");
    std::env::set_var("TELEGRAM_WEBHOOK_URL", "https://hooks.example.com/tg");
    std::env::set_var("NOTIFY_ADMIN_CHAT_ID", "777");

    let config = butler::config::Config::load().unwrap();

    let telegram = config.telegram.unwrap();
    assert_eq!(telegram.bot_token, "123:env");
    assert_eq!(
        telegram.webhook_url.as_deref(),
        Some("https://hooks.example.com/tg")
    );
    assert_eq!(config.notify_admin.unwrap().chat_id, "777");
    assert_eq!(config.server.port, 5000);

    clear_config_env_vars();
}

#[test]
#[serial]
fn test_config_explicit_path_wins() {
    clear_config_env_vars();

    let (_dir, env_path) = write_config("[server]\nport = 1111\n");
    let (_other_dir, explicit) = write_config("[server]\nport = 2222\n");
    std::env::set_var("BUTLER_CONFIG_PATH", &env_path);

    let config = butler::config::Config::load_from(Some(&explicit)).unwrap();
    assert_eq!(config.server.port, 2222);

    clear_config_env_vars();
}

#[test]
#[serial]
fn test_config_invalid_port_env_var() {
    clear_config_env_vars();

    let (_dir, path) = write_config("");
    std::env::set_var("BUTLER_CONFIG_PATH", &path);
    std::env::set_var("BUTLER_PORT", "not-a-port");

    let err = butler::config::Config::load().unwrap_err();
    assert!(err.to_string().contains("BUTLER_PORT"));

    clear_config_env_vars();
}

#[test]
#[serial]
fn test_config_missing_telegram_token() {
    clear_config_env_vars();

    let (_dir, path) = write_config("[telegram]\nbot_token = \"  \"\n");
    std::env::set_var("BUTLER_CONFIG_PATH", &path);

    let err = butler::config::Config::load().unwrap_err();
    assert!(err.to_string().contains("telegram.bot_token"));

    clear_config_env_vars();
}

#[test]
#[serial]
fn test_config_notify_admin_needs_a_bot() {
    clear_config_env_vars();

    let (_dir, path) = write_config("[notify_admin]\nchat_id = \"42\"\n");
    std::env::set_var("BUTLER_CONFIG_PATH", &path);

    let err = butler::config::Config::load().unwrap_err();
    assert!(err.to_string().contains("notify_admin"));

    // Its own token is enough
    std::env::set_var("NOTIFY_ADMIN_BOT_TOKEN", "456:admin");
    let config = butler::config::Config::load().unwrap();
    assert_eq!(
        config.notify_admin.unwrap().bot_token.as_deref(),
        Some("456:admin")
    );

    clear_config_env_vars();
}

#[test]
#[serial]
fn test_config_rejects_invalid_urls() {
    clear_config_env_vars();

    let (_dir, path) = write_config("[gears]\nmusic_destination_url = \"not a url\"\n");
    std::env::set_var("BUTLER_CONFIG_PATH", &path);
    let err = butler::config::Config::load().unwrap_err();
    assert!(format!("{:#}", err).contains("music_destination_url"));

    let (_dir, path) = write_config("[gears]\nweather_base_url = \"wttr\"\n");
    std::env::set_var("BUTLER_CONFIG_PATH", &path);
    let err = butler::config::Config::load().unwrap_err();
    assert!(format!("{:#}", err).contains("weather_base_url"));

    clear_config_env_vars();
}

#[test]
#[serial]
fn test_config_malformed_toml() {
    clear_config_env_vars();

    let (_dir, path) = write_config("[server\nport = ");
    let err = butler::config::Config::load_from(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("Failed to parse"));

    clear_config_env_vars();
}

#[test]
#[serial]
fn test_config_tasks_path_default_and_env() {
    clear_config_env_vars();

    let (_dir, path) = write_config("");
    std::env::set_var("BUTLER_CONFIG_PATH", &path);

    let config = butler::config::Config::load().unwrap();
    assert_eq!(config.tasks_path(), butler::paths::tasks_file());

    std::env::set_var("BUTLER_TASKS_FILE", "/srv/butler/tasks.toml");
    let config = butler::config::Config::load().unwrap();
    assert_eq!(config.tasks_path(), PathBuf::from("/srv/butler/tasks.toml"));

    clear_config_env_vars();
}

#[test]
#[serial]
fn test_config_blank_env_vars_are_ignored() {
    clear_config_env_vars();

    let (_dir, path) = write_config("[server]\nport = 8080\nauthorized_keys = [\"alpha\"]\n");
    // What a copied .env with unfilled entries looks like
    for var in [
        "BUTLER_HOST",
        "BUTLER_PORT",
        "BUTLER_AUTHORIZED_KEYS",
        "TELEGRAM_BOT_TOKEN",
        "TELEGRAM_WEBHOOK_URL",
        "NOTIFY_ADMIN_CHAT_ID",
        "NOTIFY_ADMIN_BOT_TOKEN",
        "MUSIC_DESTINATION_URL",
        "BUTLER_TASKS_FILE",
    ] {
        std::env::set_var(var, "");
    }

    let config = butler::config::Config::load_from(Some(&path)).unwrap();

    assert!(config.telegram.is_none());
    assert!(config.notify_admin.is_none());
    assert!(config.gears.music_destination_url.is_none());
    assert!(config.scheduler.tasks_file.is_none());
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.authorized_keys, vec!["alpha"]);

    clear_config_env_vars();
}
