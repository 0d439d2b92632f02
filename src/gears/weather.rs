// ABOUTME: Weather gear - one-line current conditions for a location
// ABOUTME: Talks to a wttr.in compatible service using its compact text format

use anyhow::{Context, Result};
use async_trait::async_trait;
use butler_core::intents::weather::{INTENT, PARAM_LOCATION};
use butler_core::{param_str, require_params, ExecutionResult, Gear, Params};
use url::Url;

pub struct WeatherGear {
    client: reqwest::Client,
    base_url: Url,
}

impl WeatherGear {
    pub fn new(client: reqwest::Client, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid weather service url '{}'", base_url))?;
        Ok(Self { client, base_url })
    }

    /// `<base>/<location>?format=3`, with the location percent-encoded as a
    /// single path segment.
    fn forecast_url(&self, location: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Weather service url cannot take a path"))?
            .pop_if_empty()
            .push(location);
        url.query_pairs_mut().append_pair("format", "3");
        Ok(url)
    }

    async fn fetch(&self, location: &str) -> Result<String> {
        let url = self.forecast_url(location)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("request failed")?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("service answered with status {}", status.as_u16());
        }
        let text = response.text().await.context("unreadable answer")?;
        let text = text.trim();
        if text.is_empty() {
            anyhow::bail!("empty answer");
        }
        Ok(text.to_string())
    }
}

#[async_trait]
impl Gear for WeatherGear {
    fn name(&self) -> &str {
        "weather"
    }

    fn intents(&self) -> &[&str] {
        &[INTENT]
    }

    async fn handle(&self, _intent: &str, params: &Params) -> ExecutionResult {
        if let Some(missing) = require_params(params, &[PARAM_LOCATION]) {
            return missing;
        }
        let location = param_str(params, PARAM_LOCATION).unwrap_or_default();
        tracing::info!(location = %location, "Searching weather conditions");

        match self.fetch(&location).await {
            Ok(forecast) => {
                ExecutionResult::ok(format!("Weather forecast for {}: {}", location, forecast))
            }
            Err(e) => {
                tracing::warn!(location = %location, error = %e, "Weather lookup failed");
                ExecutionResult::error(format!(
                    "Sorry, I don't know how to provide weather forecast for {}: {}",
                    location, e
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forecast_url_encodes_location() {
        let gear = WeatherGear::new(reqwest::Client::new(), "https://wttr.in").unwrap();
        assert_eq!(
            gear.forecast_url("Milano, Italy").unwrap().as_str(),
            "https://wttr.in/Milano,%20Italy?format=3"
        );

        let gear = WeatherGear::new(reqwest::Client::new(), "http://localhost:8080/weather/").unwrap();
        assert_eq!(
            gear.forecast_url("Pavia").unwrap().as_str(),
            "http://localhost:8080/weather/Pavia?format=3"
        );
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(WeatherGear::new(reqwest::Client::new(), "not a url").is_err());
    }
}
