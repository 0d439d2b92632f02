// ABOUTME: Sends a notification to the administrator channel
// ABOUTME: Message shaping is left to NotifyAdminSurface, delivery to the surface it wraps

use async_trait::async_trait;
use std::sync::Arc;

use crate::gear::{param_str, require_params, Gear, Params};
use crate::intents::notify_admin::{INTENT, PARAM_MESSAGE};
use crate::result::ExecutionResult;
use crate::surface::{NotifyAdminSurface, Surface};

pub struct NotifyAdminGear {
    surface: Arc<NotifyAdminSurface>,
}

impl NotifyAdminGear {
    pub fn new(surface: Arc<NotifyAdminSurface>) -> Self {
        Self { surface }
    }
}

#[async_trait]
impl Gear for NotifyAdminGear {
    fn name(&self) -> &str {
        "notify_admin"
    }

    fn intents(&self) -> &[&str] {
        &[INTENT]
    }

    async fn handle(&self, _intent: &str, params: &Params) -> ExecutionResult {
        if let Some(missing) = require_params(params, &[PARAM_MESSAGE]) {
            return missing;
        }
        let text = param_str(params, PARAM_MESSAGE).unwrap_or_default();
        let notification = self.surface.forge_notification(&text);
        if !notification.has_text() {
            return ExecutionResult::ok_silent();
        }

        match self.surface.send_message(&notification).await {
            Ok(ack) => ExecutionResult::ok(ack.unwrap_or_default()),
            Err(e) => {
                tracing::error!(
                    channel_id = self.surface.channel_id(),
                    error = %e,
                    "Admin notification failed"
                );
                ExecutionResult::error(format!("Cannot notify the administrator: {}", e))
            }
        }
    }
}
