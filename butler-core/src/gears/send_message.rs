// ABOUTME: Delivers a text to a channel of a registered surface
// ABOUTME: The relay path of the dispatcher goes through this gear

use async_trait::async_trait;
use std::sync::Arc;

use crate::gear::{param_str, require_params, Gear, Params};
use crate::intents::send_message::{INTENT, PARAM_CHANNEL_ID, PARAM_SURFACE_ID, PARAM_TEXT};
use crate::result::ExecutionResult;
use crate::surface::SurfaceMessage;
use crate::surface_registry::SurfaceRegistry;

pub struct SendMessageGear {
    surfaces: Arc<SurfaceRegistry>,
}

impl SendMessageGear {
    pub fn new(surfaces: Arc<SurfaceRegistry>) -> Self {
        Self { surfaces }
    }
}

#[async_trait]
impl Gear for SendMessageGear {
    fn name(&self) -> &str {
        "send_message"
    }

    fn intents(&self) -> &[&str] {
        &[INTENT]
    }

    async fn handle(&self, _intent: &str, params: &Params) -> ExecutionResult {
        if let Some(missing) =
            require_params(params, &[PARAM_SURFACE_ID, PARAM_CHANNEL_ID, PARAM_TEXT])
        {
            return missing;
        }

        let message = SurfaceMessage::new(
            param_str(params, PARAM_SURFACE_ID),
            param_str(params, PARAM_CHANNEL_ID),
            param_str(params, PARAM_TEXT),
        );
        let Some(surface_id) = message.surface_id() else {
            return ExecutionResult::error("Missing surface_id parameter in the request");
        };
        let Some(surface) = self.surfaces.get(surface_id) else {
            return ExecutionResult::error(format!(
                "Cannot find a surface to process message for {}",
                surface_id
            ));
        };
        if !message.has_text() {
            tracing::debug!(surface_id = %surface_id, "Nothing to send");
            return ExecutionResult::ok_silent();
        }

        match surface.send_message(&message).await {
            Ok(ack) => ExecutionResult::ok(ack.unwrap_or_default()),
            Err(e) => {
                tracing::warn!(surface_id = %surface_id, error = %e, "Surface failed to send message");
                ExecutionResult::error(e.to_string())
            }
        }
    }
}
