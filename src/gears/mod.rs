// ABOUTME: Gears that reach third-party HTTP services
// ABOUTME: Song tracing and weather forecasts, both built on a shared reqwest client

mod music;
mod weather;

pub use music::MusicGear;
pub use weather::WeatherGear;

use anyhow::{Context, Result};
use std::time::Duration;

/// HTTP client shared by the network gears.
pub fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("butler/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("Failed to build HTTP client")
}
