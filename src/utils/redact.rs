use serde_json::Value as JsonValue;

/// Masks credentials and free-text evaluation content before a payload is logged.
pub fn redact_payload(data: &JsonValue) -> JsonValue {
    match data {
        JsonValue::Object(map) => {
            let mut redacted_map = serde_json::Map::new();
            for (key, val) in map {
                let redacted_val = if is_sensitive_field(key) {
                    redact_string_value(val)
                } else {
                    redact_payload(val)
                };
                redacted_map.insert(key.clone(), redacted_val);
            }
            JsonValue::Object(redacted_map)
        }
        JsonValue::Array(items) => JsonValue::Array(items.iter().map(redact_payload).collect()),
        _ => data.clone(),
    }
}

fn is_sensitive_field(field_name: &str) -> bool {
    let lower = field_name.to_lowercase();
    matches!(
        lower.as_str(),
        "password"
            | "senha"
            | "token"
            | "access_token"
            | "accesstoken"
            | "email"
            | "justification"
            | "comment"
    )
}

fn redact_string_value(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::String(s) if !s.is_empty() => JsonValue::String("[REDACTED]".to_string()),
        _ => value.clone(),
    }
}
