//! Sanitizer: redacts sensitive material from workflow documents.
//!
//! [`clean`] walks an arbitrary JSON tree and replaces credential-bearing
//! fields and webhook URLs with deterministic placeholders, producing a copy
//! that is safe to reuse downstream, including as prompt context handed to
//! a generative model.

use serde_json::{Map, Value};

/// Field names whose values are redacted regardless of type. Matched
/// case-insensitively at every depth.
const SENSITIVE_KEYS: &[&str] = &[
    "webhookid",
    "webhookurl",
    "connectionid",
    "credential",
    "credentials",
    "apikey",
    "api_key",
    "accesstoken",
    "access_token",
    "authtoken",
    "auth_token",
    "token",
    "secret",
    "password",
    "privatekey",
    "private_key",
];

/// Host substrings that mark a string value as a secret-bearing URL. Webhook
/// endpoints embed capability tokens in the path, so the whole string is
/// replaced, not just the host.
const SENSITIVE_URL_HOSTS: &[&str] = &[
    "hooks.slack.com",
    "hooks.zapier.com",
    "hook.integromat.com",
    "webhook.site",
];

/// Replacement for matched URL strings.
pub const PLACEHOLDER_URL: &str = "https://example.com/webhook";

fn is_sensitive_key(key: &str) -> bool {
    let lowered = key.to_lowercase();
    SENSITIVE_KEYS.contains(&lowered.as_str())
}

fn key_placeholder(key: &str) -> String {
    format!("{{{{{}}}}}", key.to_uppercase())
}

fn is_sensitive_url(value: &str) -> bool {
    SENSITIVE_URL_HOSTS.iter().any(|host| value.contains(host))
}

/// Produce a sanitized copy of `node`.
///
/// Pure and total over any JSON value: arrays are mapped element-wise,
/// objects have sensitive keys replaced by `{{KEY_NAME_UPPERCASED}}` and
/// secret-bearing URL strings replaced by [`PLACEHOLDER_URL`], scalars and
/// null pass through unchanged. Idempotent: `clean(clean(v)) == clean(v)`.
pub fn clean(node: &Value) -> Value {
    match node {
        Value::Array(items) => Value::Array(items.iter().map(clean).collect()),
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, value) in map {
                if is_sensitive_key(key) {
                    out.insert(key.clone(), Value::String(key_placeholder(key)));
                } else if let Value::String(s) = value {
                    if is_sensitive_url(s) {
                        out.insert(key.clone(), Value::String(PLACEHOLDER_URL.to_string()));
                    } else {
                        out.insert(key.clone(), value.clone());
                    }
                } else {
                    out.insert(key.clone(), clean(value));
                }
            }
            Value::Object(out)
        }
        scalar => scalar.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "name": "Order Webhook",
            "webhookId": "whk_8f2a91c4",
            "nodes": [
                {
                    "type": "http",
                    "url": "https://hooks.slack.com/services/T000/B000/XXXX",
                    "credentials": { "apiUser": "svc", "apiKey": "sk-123" }
                },
                { "type": "set", "value": 42 }
            ],
            "meta": { "Token": "abc", "note": null }
        })
    }

    #[test]
    fn test_clean_replaces_sensitive_keys() {
        let cleaned = clean(&sample());
        assert_eq!(cleaned["webhookId"], "{{WEBHOOKID}}");
        assert_eq!(cleaned["nodes"][0]["credentials"], "{{CREDENTIALS}}");
        assert_eq!(cleaned["meta"]["Token"], "{{TOKEN}}");
    }

    #[test]
    fn test_clean_replaces_webhook_urls() {
        let cleaned = clean(&sample());
        assert_eq!(cleaned["nodes"][0]["url"], PLACEHOLDER_URL);
    }

    #[test]
    fn test_clean_preserves_everything_else() {
        let cleaned = clean(&sample());
        assert_eq!(cleaned["name"], "Order Webhook");
        assert_eq!(cleaned["nodes"][1]["value"], 42);
        assert_eq!(cleaned["meta"]["note"], Value::Null);
        assert_eq!(cleaned["nodes"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_clean_idempotent() {
        let once = clean(&sample());
        let twice = clean(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_clean_no_residual_value_at_any_depth() {
        let doc = json!({
            "a": { "b": { "c": { "password": "hunter2" } } },
            "list": [ { "secret": { "nested": true } } ]
        });
        let cleaned = clean(&doc);
        assert_eq!(cleaned["a"]["b"]["c"]["password"], "{{PASSWORD}}");
        assert_eq!(cleaned["list"][0]["secret"], "{{SECRET}}");
        assert!(!cleaned.to_string().contains("hunter2"));
        assert!(!cleaned.to_string().contains("nested"));
    }

    #[test]
    fn test_clean_scalars_pass_through() {
        assert_eq!(clean(&json!(7)), json!(7));
        assert_eq!(clean(&json!("plain")), json!("plain"));
        assert_eq!(clean(&Value::Null), Value::Null);
        assert_eq!(clean(&json!(true)), json!(true));
    }
}
