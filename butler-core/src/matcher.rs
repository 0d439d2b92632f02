// ABOUTME: Rule-based intent matcher turning short sentences into an intent and its parameters
// ABOUTME: Ordered, case-insensitive prefix rules with fixed-offset slicing; first match wins

use serde_json::Value;

use crate::gear::Params;
use crate::intents::{echo, music, weather};

/// How parameters are cut out of the text that follows a trigger.
enum Extraction {
    /// Everything after the trigger, trimmed, goes into `param`.
    Remainder { param: &'static str },
    /// The text between the trigger and the first `end` marker is split on the
    /// last `separator`: the left side goes into `left`, the right into `right`.
    Span {
        end: &'static str,
        separator: &'static str,
        left: &'static str,
        right: &'static str,
    },
}

struct Trigger {
    prefix: &'static str,
    extraction: Extraction,
}

struct Rule {
    intent: &'static str,
    triggers: &'static [Trigger],
}

/// Rules in evaluation order. Earlier rules win when a sentence fits more than one.
const RULES: &[Rule] = &[
    Rule {
        intent: echo::INTENT,
        triggers: &[
            Trigger {
                prefix: "echo ",
                extraction: Extraction::Remainder {
                    param: echo::PARAM_MESSAGE,
                },
            },
            Trigger {
                prefix: "say ",
                extraction: Extraction::Remainder {
                    param: echo::PARAM_MESSAGE,
                },
            },
            Trigger {
                prefix: "repeat ",
                extraction: Extraction::Remainder {
                    param: echo::PARAM_MESSAGE,
                },
            },
        ],
    },
    Rule {
        intent: music::INTENT,
        triggers: &[
            // SoundHound share texts, english and italian
            Trigger {
                prefix: "Just used SoundHound to find ",
                extraction: Extraction::Span {
                    end: "https://",
                    separator: " by ",
                    left: music::PARAM_TITLE,
                    right: music::PARAM_AUTHOR,
                },
            },
            Trigger {
                prefix: "Appena usato SoundHound per trovare ",
                extraction: Extraction::Span {
                    end: "https://",
                    separator: " di ",
                    left: music::PARAM_TITLE,
                    right: music::PARAM_AUTHOR,
                },
            },
            Trigger {
                prefix: "Ho trovato ",
                extraction: Extraction::Span {
                    end: " con SoundHound",
                    separator: " di ",
                    left: music::PARAM_TITLE,
                    right: music::PARAM_AUTHOR,
                },
            },
        ],
    },
    Rule {
        intent: weather::INTENT,
        triggers: &[
            Trigger {
                prefix: "weather ",
                extraction: Extraction::Remainder {
                    param: weather::PARAM_LOCATION,
                },
            },
            Trigger {
                prefix: "meteo ",
                extraction: Extraction::Remainder {
                    param: weather::PARAM_LOCATION,
                },
            },
        ],
    },
];

/// Infer intent and parameters from a sentence.
///
/// Returns `(None, {})` for a missing sentence or when no rule matches. A rule
/// whose trigger matches but whose extraction comes up empty does not count as
/// a match, and evaluation moves on to the next rule.
pub fn infer_intent_and_params(message: Option<&str>) -> (Option<String>, Params) {
    let Some(message) = message else {
        return (None, Params::new());
    };
    let text = message.trim();

    for rule in RULES {
        for trigger in rule.triggers {
            let Some(rest) = strip_prefix_ignore_ascii_case(text, trigger.prefix) else {
                continue;
            };
            if let Some(params) = extract(rest, &trigger.extraction) {
                tracing::debug!(intent = rule.intent, trigger = trigger.prefix, "Intent matched");
                return (Some(rule.intent.to_string()), params);
            }
        }
    }

    (None, Params::new())
}

fn extract(rest: &str, extraction: &Extraction) -> Option<Params> {
    let mut params = Params::new();
    match extraction {
        Extraction::Remainder { param } => {
            let value = rest.trim();
            if value.is_empty() {
                return None;
            }
            params.insert(param.to_string(), Value::String(value.to_string()));
        }
        Extraction::Span {
            end,
            separator,
            left,
            right,
        } => {
            let end_at = find_ignore_ascii_case(rest, end)?;
            let span = &rest[..end_at];
            let split_at = rfind_ignore_ascii_case(span, separator)?;
            let left_value = span[..split_at].trim();
            let right_value = span[split_at + separator.len()..].trim();
            if left_value.is_empty() || right_value.is_empty() {
                return None;
            }
            params.insert(left.to_string(), Value::String(left_value.to_string()));
            params.insert(right.to_string(), Value::String(right_value.to_string()));
        }
    }
    Some(params)
}

// Triggers and markers are ASCII, so ASCII folding keeps byte offsets valid on
// the original text and slicing never lands inside a multi-byte character.

fn strip_prefix_ignore_ascii_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&text[prefix.len()..])
    } else {
        None
    }
}

fn matches_at(haystack: &str, at: usize, needle: &str) -> bool {
    haystack
        .get(at..at + needle.len())
        .is_some_and(|window| window.eq_ignore_ascii_case(needle))
}

fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .char_indices()
        .map(|(i, _)| i)
        .find(|&i| matches_at(haystack, i, needle))
}

fn rfind_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .char_indices()
        .rev()
        .map(|(i, _)| i)
        .find(|&i| matches_at(haystack, i, needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_ignore_ascii_case() {
        assert_eq!(find_ignore_ascii_case("abc HTTPS://x", "https://"), Some(4));
        assert_eq!(find_ignore_ascii_case("abc", "https://"), None);
        assert_eq!(rfind_ignore_ascii_case("a by b BY c", " by "), Some(6));
    }

    #[test]
    fn test_multibyte_text_does_not_panic() {
        assert_eq!(find_ignore_ascii_case("piacerà! https://", "https://"), Some(10));
        assert_eq!(strip_prefix_ignore_ascii_case("è", "echo "), None);
    }
}
