//! Recovers a JSON object from raw generator text.
//!
//! Generators wrap their JSON in markdown fences, prepend chatter, or append
//! explanations. Fenced content wins; otherwise the text between the first
//! `{` and the last `}` is parsed.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtractError {
    #[error("no JSON object found in response")]
    NoJsonFound,
    #[error("response JSON could not be parsed: {0}")]
    MalformedJson(String),
    #[error("response JSON contains no plan days")]
    NoPlanDays,
}

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)```[ \t]*(?:json|JSON)?[ \t]*\r?\n?(.*?)```")
            .expect("fence pattern is a valid regex")
    })
}

/// Returns the body of the first fenced block that contains an object, if any.
fn fenced_block(raw: &str) -> Option<&str> {
    fence_regex()
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .find(|body| body.contains('{'))
}

/// Slices `text` from the first `{` through the last `}`.
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Extracts and parses the JSON object embedded in `raw`.
pub fn extract_json(raw: &str) -> Result<Value, ExtractError> {
    let scope = fenced_block(raw).unwrap_or(raw);
    let candidate = brace_span(scope).ok_or(ExtractError::NoJsonFound)?;

    serde_json::from_str::<Value>(candidate).map_err(|e| {
        tracing::debug!(error = %e, "Generator response contained malformed JSON");
        ExtractError::MalformedJson(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_object() {
        let value = extract_json(r#"{"days": []}"#).unwrap();
        assert_eq!(value, json!({"days": []}));
    }

    #[test]
    fn test_json_tagged_fence() {
        let raw = "Here is your plan:\n```json\n{\"days\": [1, 2]}\n```\nEnjoy!";
        assert_eq!(extract_json(raw).unwrap(), json!({"days": [1, 2]}));
    }

    #[test]
    fn test_untagged_fence() {
        let raw = "```\n{\"notes\": [\"hydrate\"]}\n```";
        assert_eq!(extract_json(raw).unwrap(), json!({"notes": ["hydrate"]}));
    }

    #[test]
    fn test_fence_preferred_over_surrounding_braces() {
        let raw = "Use {curly} words.\n```json\n{\"a\": 1}\n```\nThat's {all}.";
        assert_eq!(extract_json(raw).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_noisy_prefix_and_suffix() {
        let raw = "Sure! {\"a\": {\"b\": 2}} Let me know if you need more.";
        assert_eq!(extract_json(raw).unwrap(), json!({"a": {"b": 2}}));
    }

    #[test]
    fn test_no_json() {
        assert_eq!(
            extract_json("I cannot help with that."),
            Err(ExtractError::NoJsonFound)
        );
        assert_eq!(extract_json("} backwards {"), Err(ExtractError::NoJsonFound));
    }

    #[test]
    fn test_malformed_json() {
        let result = extract_json("```json\n{\"days\": [\n```");
        // The fenced body never closes its object.
        assert_eq!(result, Err(ExtractError::NoJsonFound));

        let result = extract_json("{\"days\": [1, 2,, ]}");
        assert!(matches!(result, Err(ExtractError::MalformedJson(_))));
    }
}
