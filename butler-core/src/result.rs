// ABOUTME: Uniform outcome of handling an intent: success or failure plus ordered messages
// ABOUTME: An OK result with no messages means "nothing to report", not an error

use serde::Serialize;

/// Whether a gear managed to do its job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Ok,
    Error,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Ok => write!(f, "ok"),
            Outcome::Error => write!(f, "error"),
        }
    }
}

/// Result of a gear invocation.
///
/// Outcome and messages are independent: failures usually carry an
/// explanation, successes may carry nothing at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    outcome: Outcome,
    messages: Vec<String>,
}

impl ExecutionResult {
    pub fn new(outcome: Outcome, messages: Vec<String>) -> Self {
        Self { outcome, messages }
    }

    /// Success with a single message. An empty message is dropped.
    pub fn ok(message: impl Into<String>) -> Self {
        Self::with_single(Outcome::Ok, message.into())
    }

    /// Success with nothing to say.
    pub fn ok_silent() -> Self {
        Self::new(Outcome::Ok, Vec::new())
    }

    /// Failure with a single explanation. An empty explanation is dropped.
    pub fn error(message: impl Into<String>) -> Self {
        Self::with_single(Outcome::Error, message.into())
    }

    fn with_single(outcome: Outcome, message: String) -> Self {
        let messages = if message.is_empty() {
            Vec::new()
        } else {
            vec![message]
        };
        Self { outcome, messages }
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn went_well(&self) -> bool {
        self.outcome == Outcome::Ok
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn has_messages(&self) -> bool {
        !self.messages.is_empty()
    }

    pub fn into_messages(self) -> Vec<String> {
        self.messages
    }
}
