// ABOUTME: Music gear - records a song title and author by posting a form to a destination URL
// ABOUTME: The destination is usually a spreadsheet web app collecting songs heard around

use async_trait::async_trait;
use butler_core::intents::music::{INTENT, PARAM_AUTHOR, PARAM_TITLE};
use butler_core::{param_str, require_params, ExecutionResult, Gear, Params};

pub struct MusicGear {
    client: reqwest::Client,
    destination_url: String,
}

impl MusicGear {
    pub fn new(client: reqwest::Client, destination_url: impl Into<String>) -> Self {
        Self {
            client,
            destination_url: destination_url.into(),
        }
    }
}

#[async_trait]
impl Gear for MusicGear {
    fn name(&self) -> &str {
        "music"
    }

    fn intents(&self) -> &[&str] {
        &[INTENT]
    }

    async fn handle(&self, _intent: &str, params: &Params) -> ExecutionResult {
        if let Some(missing) = require_params(params, &[PARAM_TITLE, PARAM_AUTHOR]) {
            return missing;
        }
        let title = param_str(params, PARAM_TITLE).unwrap_or_default();
        let author = param_str(params, PARAM_AUTHOR).unwrap_or_default();

        tracing::info!(title = %title, author = %author, "Tracing song");
        let form = [("Author", author.as_str()), ("Title", title.as_str())];
        let response = match self
            .client
            .post(&self.destination_url)
            .form(&form)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, "Music destination unreachable");
                return ExecutionResult::error(format!(
                    "An error happened while adding the song: {}",
                    e
                ));
            }
        };

        let status = response.status();
        if status.is_success() {
            return ExecutionResult::ok(format!("{} by {} has been added", title, author));
        }

        // 2xx is all we check: the destination gives no richer signal
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = %status, "Music destination refused the song");
        ExecutionResult::error(format!(
            "Error adding the song: status {}, {}",
            status.as_u16(),
            body
        ))
    }
}
