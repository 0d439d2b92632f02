// ABOUTME: Ordered gear registry routing intents to the first gear that accepts them
// ABOUTME: Also relays result messages to surfaces by dispatching the send_message intent

use serde_json::Value;
use std::sync::Arc;

use crate::gear::{Gear, Params};
use crate::intents::send_message;
use crate::result::{ExecutionResult, Outcome};

/// Returned when no registered gear claims the intent.
pub const NO_GEAR_MESSAGE: &str = "No gear to process your intent";

/// Sent once when relaying a message to a surface fails.
pub const RELAY_FAILURE_NOTICE: &str = "There was a problem communicating the result of your request";

/// Called after every dispatch with the intent and its outcome, relay sends included.
pub type DispatchObserver = Arc<dyn Fn(&str, Outcome) + Send + Sync>;

/// Routes intents to gears.
///
/// Gears are registered once at startup and checked in registration order,
/// so when two gears claim the same intent the first one always wins.
pub struct Dispatcher {
    gears: Vec<Arc<dyn Gear>>,
    observer: Option<DispatchObserver>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            gears: Vec::new(),
            observer: None,
        }
    }

    pub fn set_observer(&mut self, observer: DispatchObserver) {
        self.observer = Some(observer);
    }

    pub fn register(&mut self, gear: Arc<dyn Gear>) {
        tracing::debug!(gear = gear.name(), intents = ?gear.intents(), "Registered gear");
        self.gears.push(gear);
    }

    /// Names of the registered gears, in registration order.
    pub fn gear_names(&self) -> Vec<String> {
        self.gears.iter().map(|g| g.name().to_string()).collect()
    }

    /// Hand the intent to the first gear that accepts it.
    ///
    /// An unclaimed intent is an ordinary ERROR result, not a failure of the
    /// dispatcher itself.
    pub async fn dispatch(&self, intent: &str, params: &Params) -> ExecutionResult {
        let result = self.route(intent, params).await;
        if let Some(observer) = &self.observer {
            observer(intent, result.outcome());
        }
        result
    }

    async fn route(&self, intent: &str, params: &Params) -> ExecutionResult {
        let Some(gear) = self.gears.iter().find(|g| g.accepts(intent)) else {
            tracing::warn!(intent = %intent, "No gear accepts intent");
            return ExecutionResult::error(NO_GEAR_MESSAGE);
        };

        tracing::debug!(intent = %intent, gear = gear.name(), "Dispatching intent");
        let result = gear.handle(intent, params).await;
        tracing::info!(
            intent = %intent,
            gear = gear.name(),
            outcome = %result.outcome(),
            messages = result.messages().len(),
            "Intent processed"
        );
        result
    }

    /// Forward messages to a surface channel, one send_message dispatch each.
    ///
    /// Blank messages are skipped. When a send fails, a single notice about the
    /// failure goes to the same channel; if that fails as well it is only logged.
    /// Returns how many messages were delivered.
    pub async fn relay(
        &self,
        surface_id: Option<&str>,
        channel_id: Option<&str>,
        messages: Option<&[String]>,
    ) -> usize {
        let Some(messages) = messages.filter(|m| !m.is_empty()) else {
            return 0;
        };

        let mut delivered = 0;
        for text in messages.iter().filter(|m| !m.trim().is_empty()) {
            let result = self.send(surface_id, channel_id, text).await;
            if result.went_well() {
                delivered += 1;
                continue;
            }

            tracing::warn!(
                surface_id = surface_id.unwrap_or_default(),
                channel_id = channel_id.unwrap_or_default(),
                reason = %result.messages().join("; "),
                "Relaying message failed, sending failure notice"
            );
            let notice = self
                .send(surface_id, channel_id, RELAY_FAILURE_NOTICE)
                .await;
            if !notice.went_well() {
                tracing::error!(
                    surface_id = surface_id.unwrap_or_default(),
                    channel_id = channel_id.unwrap_or_default(),
                    reason = %notice.messages().join("; "),
                    "Failure notice could not be delivered either"
                );
            }
        }
        delivered
    }

    async fn send(
        &self,
        surface_id: Option<&str>,
        channel_id: Option<&str>,
        text: &str,
    ) -> ExecutionResult {
        let mut params = Params::new();
        params.insert(send_message::PARAM_SURFACE_ID.to_string(), optional(surface_id));
        params.insert(send_message::PARAM_CHANNEL_ID.to_string(), optional(channel_id));
        params.insert(
            send_message::PARAM_TEXT.to_string(),
            Value::String(text.to_string()),
        );
        self.dispatch(send_message::INTENT, &params).await
    }
}

fn optional(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |v| Value::String(v.to_string()))
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
