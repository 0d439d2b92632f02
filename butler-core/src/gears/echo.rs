// ABOUTME: Echo gear - answers with the message it was given
// ABOUTME: An empty message is a silent success, a missing one is an error

use async_trait::async_trait;

use crate::gear::{param_str, require_params, Gear, Params};
use crate::intents::echo;
use crate::result::ExecutionResult;

#[derive(Debug, Default)]
pub struct EchoMessageGear;

impl EchoMessageGear {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Gear for EchoMessageGear {
    fn name(&self) -> &str {
        "echo"
    }

    fn intents(&self) -> &[&str] {
        &[echo::INTENT]
    }

    async fn handle(&self, _intent: &str, params: &Params) -> ExecutionResult {
        if let Some(missing) = require_params(params, &[echo::PARAM_MESSAGE]) {
            return missing;
        }
        // An empty message is present but has nothing to say
        ExecutionResult::ok(param_str(params, echo::PARAM_MESSAGE).unwrap_or_default())
    }
}
