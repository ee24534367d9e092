//! Removal of Anthropic-specific thinking parameters from request bodies
//!
//! These params (`thinking`, `budget_tokens`, ...) are only understood by the
//! Anthropic API and cause errors when LiteLLM forwards them to local models.
//! Two call sites need this with different coverage:
//!
//! - The proxy handler strips recursively, at any depth, for every JSON body.
//! - A LiteLLM-side pre-call hook strips shallowly from the request params
//!   (plus nested `extra_body` and `metadata`), and only for models whose
//!   identifier contains the `ollama` marker.
//!
//! Both key sets derive from [`THINKING_KEYS`] so they cannot drift apart.

use serde_json::{Map, Value};

/// Keys removed by the proxy's recursive strip. Exact, case-sensitive match.
pub const THINKING_KEYS: [&str; 4] = [
    "thinking",
    "extended_thinking",
    "thinking_budget",
    "budget_tokens",
];

/// Keys removed by the pre-call hook: the proxy set plus the beta-features
/// field, which LiteLLM surfaces as a top-level param rather than inside the
/// body.
pub const PIPELINE_KEYS: [&str; 5] = [
    THINKING_KEYS[0],
    THINKING_KEYS[1],
    THINKING_KEYS[2],
    THINKING_KEYS[3],
    "anthropic_beta",
];

/// Marker substring identifying models that need the pre-call strip.
pub const LOCAL_MODEL_MARKER: &str = "ollama";

/// Recursively remove thinking params from a decoded JSON tree, in place.
///
/// Objects lose any key in [`THINKING_KEYS`] together with its whole subtree
/// (no descent into a removed value); surviving object and array values are
/// recursed into. Scalars are left untouched. Returns whether anything was
/// removed, so callers can skip re-serialization when nothing changed.
pub fn strip_thinking_params(value: &mut Value) -> bool {
    match value {
        Value::Object(map) => {
            let mut modified = false;
            for key in THINKING_KEYS {
                if map.shift_remove(key).is_some() {
                    modified = true;
                }
            }
            for child in map.values_mut() {
                if matches!(child, Value::Object(_) | Value::Array(_))
                    && strip_thinking_params(child)
                {
                    modified = true;
                }
            }
            modified
        }
        Value::Array(items) => {
            let mut modified = false;
            for item in items {
                if matches!(item, Value::Object(_) | Value::Array(_))
                    && strip_thinking_params(item)
                {
                    modified = true;
                }
            }
            modified
        }
        _ => false,
    }
}

/// Check whether a model identifier is one the pre-call hook should strip for.
pub fn model_wants_stripping(model: &str) -> bool {
    model.to_lowercase().contains(LOCAL_MODEL_MARKER)
}

/// Shallow strip for the LiteLLM pre-call hook contract.
///
/// Removes [`PIPELINE_KEYS`] from the top level of `params`, and from the
/// nested `extra_body` and `metadata` objects when present. Deliberately does
/// NOT recurse further: the hook only ever sees flat call kwargs, and deeper
/// structures (messages etc.) are handled by the proxy before LiteLLM sees
/// them. Returns whether anything was removed.
pub fn strip_request_params(params: &mut Map<String, Value>) -> bool {
    let mut modified = false;

    for key in PIPELINE_KEYS {
        if params.shift_remove(key).is_some() {
            modified = true;
        }
    }

    for nested in ["extra_body", "metadata"] {
        if let Some(Value::Object(inner)) = params.get_mut(nested) {
            for key in PIPELINE_KEYS {
                if inner.shift_remove(key).is_some() {
                    modified = true;
                }
            }
        }
    }

    modified
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_top_level_keys() {
        let mut body = json!({
            "model": "x",
            "thinking": {"type": "enabled", "budget_tokens": 100},
            "extended_thinking": true,
        });
        assert!(strip_thinking_params(&mut body));
        assert_eq!(body, json!({"model": "x"}));
    }

    #[test]
    fn strips_nested_keys_at_any_depth() {
        // Object-in-array-in-object nesting
        let mut body = json!({
            "model": "x",
            "messages": [
                {"thinking_budget": 5, "text": "hi"},
                {"content": [{"nested": {"budget_tokens": 9}}]},
            ],
        });
        assert!(strip_thinking_params(&mut body));
        assert_eq!(
            body,
            json!({
                "model": "x",
                "messages": [
                    {"text": "hi"},
                    {"content": [{"nested": {}}]},
                ],
            })
        );
    }

    #[test]
    fn spec_example_from_proxy() {
        let mut body = json!({
            "model": "x",
            "thinking": {"budget_tokens": 100},
            "messages": [{"thinking_budget": 5, "text": "hi"}],
        });
        assert!(strip_thinking_params(&mut body));
        assert_eq!(body, json!({"model": "x", "messages": [{"text": "hi"}]}));
    }

    #[test]
    fn removed_subtree_is_discarded_whole() {
        // A forbidden key whose value contains further forbidden keys goes
        // away in one removal; the result reports modified exactly once and
        // stripping again reports nothing.
        let mut body = json!({
            "thinking": {"thinking": {"budget_tokens": 1}},
            "keep": 1,
        });
        assert!(strip_thinking_params(&mut body));
        assert_eq!(body, json!({"keep": 1}));
        assert!(!strip_thinking_params(&mut body));
    }

    #[test]
    fn idempotent_with_identical_serialization() {
        let mut body = json!({
            "model": "x",
            "thinking": true,
            "messages": [{"budget_tokens": 2}],
        });
        assert!(strip_thinking_params(&mut body));
        let first = serde_json::to_vec(&body).unwrap();

        assert!(!strip_thinking_params(&mut body));
        let second = serde_json::to_vec(&body).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn preserves_sibling_order() {
        let mut body = json!({
            "zeta": 1,
            "thinking": true,
            "alpha": 2,
            "mid": {"b": 1, "budget_tokens": 3, "a": 2},
        });
        assert!(strip_thinking_params(&mut body));
        let keys: Vec<&String> = body.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
        let inner: Vec<&String> = body["mid"].as_object().unwrap().keys().collect();
        assert_eq!(inner, ["b", "a"]);
    }

    #[test]
    fn leaves_clean_bodies_untouched() {
        let mut body = json!({"model": "x", "messages": []});
        assert!(!strip_thinking_params(&mut body));
        assert_eq!(body, json!({"model": "x", "messages": []}));
    }

    #[test]
    fn scalar_and_empty_roots_are_noops() {
        for mut v in [json!(42), json!("thinking"), json!(null), json!({}), json!([])] {
            assert!(!strip_thinking_params(&mut v));
        }
    }

    #[test]
    fn scalars_named_like_keys_survive_in_arrays() {
        // Array elements are values, not keys - a string "thinking" stays.
        let mut body = json!({"tags": ["thinking", "other"]});
        assert!(!strip_thinking_params(&mut body));
        assert_eq!(body, json!({"tags": ["thinking", "other"]}));
    }

    #[test]
    fn pipeline_set_is_superset_of_proxy_set() {
        for key in THINKING_KEYS {
            assert!(PIPELINE_KEYS.contains(&key));
        }
        assert!(PIPELINE_KEYS.contains(&"anthropic_beta"));
    }

    #[test]
    fn marker_match_is_case_insensitive() {
        assert!(model_wants_stripping("ollama/llama3"));
        assert!(model_wants_stripping("Ollama-Chat"));
        assert!(!model_wants_stripping("claude-sonnet"));
    }

    #[test]
    fn shallow_strip_covers_params_extra_body_and_metadata() {
        let mut params = json!({
            "model": "ollama/llama3",
            "thinking": true,
            "anthropic_beta": ["x"],
            "extra_body": {"budget_tokens": 5, "keep": 1},
            "metadata": {"extended_thinking": true, "user": "u"},
        });
        let map = params.as_object_mut().unwrap();
        assert!(strip_request_params(map));
        assert_eq!(
            Value::Object(map.clone()),
            json!({
                "model": "ollama/llama3",
                "extra_body": {"keep": 1},
                "metadata": {"user": "u"},
            })
        );
    }

    #[test]
    fn shallow_strip_does_not_recurse_into_messages() {
        // Only extra_body and metadata are inspected below the top level.
        let mut params = json!({
            "messages": [{"thinking_budget": 5}],
        });
        let map = params.as_object_mut().unwrap();
        assert!(!strip_request_params(map));
        assert_eq!(params["messages"], json!([{"thinking_budget": 5}]));
    }

    #[test]
    fn shallow_strip_noop_reports_unmodified() {
        let mut params = json!({"model": "ollama/llama3", "extra_body": {}});
        let map = params.as_object_mut().unwrap();
        assert!(!strip_request_params(map));
    }
}
