use serde_json::Value;
use shepherd_types::Usage;

/// Normalize a provider's raw usage object into the canonical [`Usage`]
/// shape, recognizing any of three known wire shapes: OpenAI-compatible
/// (`prompt_tokens` / `completion_tokens`), Anthropic-native (`input_tokens`
/// / `output_tokens`), or already-canonical camelCase (`inputTokens` /
/// `outputTokens`). Within whichever shape is detected, an absent sibling
/// field becomes zero. An object matching none of the three shapes
/// normalizes to all-zero usage.
pub fn normalize_usage(value: &Value) -> Usage {
    let get = |key: &str| value.get(key).and_then(Value::as_u64).unwrap_or(0);

    if has_any(value, &["prompt_tokens", "completion_tokens"]) {
        Usage::new(get("prompt_tokens"), get("completion_tokens"))
    } else if has_any(value, &["input_tokens", "output_tokens"]) {
        Usage::new(get("input_tokens"), get("output_tokens"))
    } else if has_any(value, &["inputTokens", "outputTokens"]) {
        Usage::new(get("inputTokens"), get("outputTokens"))
    } else {
        Usage::new(0, 0)
    }
}

fn has_any(value: &Value, keys: &[&str]) -> bool {
    keys.iter().any(|k| value.get(*k).is_some())
}
