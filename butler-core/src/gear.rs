// ABOUTME: Gear trait - a unit of functionality that claims one or more intents
// ABOUTME: Also holds the parameter map type and helpers for reading required parameters

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

use crate::result::ExecutionResult;

/// Parameters extracted from a sentence or received from the API.
///
/// Never absent: an intent without parameters gets an empty map.
pub type Params = HashMap<String, Value>;

/// A handler for one or more intents.
///
/// Gears own their failure handling: network errors, parse errors and missing
/// parameters come back as [`ExecutionResult::error`], never as panics.
#[async_trait]
pub trait Gear: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Intents this gear claims.
    fn intents(&self) -> &[&str];

    /// Case-insensitive check against the claimed intents.
    fn accepts(&self, intent: &str) -> bool {
        let wanted = intent.to_lowercase();
        self.intents()
            .iter()
            .any(|claimed| claimed.to_lowercase() == wanted)
    }

    /// Process the intent.
    async fn handle(&self, intent: &str, params: &Params) -> ExecutionResult;
}

/// Read a parameter as text.
///
/// Strings are returned as-is, booleans and numbers in their textual form,
/// `null` and missing keys as `None`.
pub fn param_str(params: &Params, key: &str) -> Option<String> {
    match params.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Check that every key in `required` is present.
///
/// Returns the error result to hand back when something is missing, naming
/// all the missing keys.
pub fn require_params(params: &Params, required: &[&str]) -> Option<ExecutionResult> {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|key| param_str(params, key).is_none())
        .collect();

    if missing.is_empty() {
        return None;
    }

    Some(ExecutionResult::error(format!(
        "Missing {} parameter in the request",
        missing.join(", ")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Claims(&'static [&'static str]);

    #[async_trait]
    impl Gear for Claims {
        fn name(&self) -> &str {
            "claims"
        }

        fn intents(&self) -> &[&str] {
            self.0
        }

        async fn handle(&self, _intent: &str, _params: &Params) -> ExecutionResult {
            ExecutionResult::ok_silent()
        }
    }

    #[test]
    fn test_accepts_ignores_case() {
        let gear = Claims(&["echo_message"]);
        assert!(gear.accepts("ECHO_MESSAGE"));
        assert!(gear.accepts("Echo_Message"));
        assert!(!gear.accepts("echo"));
    }

    #[test]
    fn test_param_str_renders_scalars() {
        let params: Params = [
            ("s".to_string(), json!("text")),
            ("b".to_string(), json!(true)),
            ("n".to_string(), json!(42)),
            ("z".to_string(), Value::Null),
        ]
        .into_iter()
        .collect();

        assert_eq!(param_str(&params, "s").as_deref(), Some("text"));
        assert_eq!(param_str(&params, "b").as_deref(), Some("true"));
        assert_eq!(param_str(&params, "n").as_deref(), Some("42"));
        assert_eq!(param_str(&params, "z"), None);
        assert_eq!(param_str(&params, "missing"), None);
    }

    #[test]
    fn test_require_params_names_all_missing() {
        let params: Params = [("title".to_string(), json!("Song"))].into_iter().collect();

        assert!(require_params(&params, &["title"]).is_none());

        let err = require_params(&params, &["title", "author", "year"]).unwrap();
        assert!(!err.went_well());
        assert_eq!(
            err.messages(),
            ["Missing author, year parameter in the request".to_string()]
        );
    }
}
