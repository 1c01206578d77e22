//! Default-filling accessors over JSON:API payloads.
//!
//! Upstream omits fields inconsistently, so nothing here fails: a missing or
//! mistyped value becomes the zero value for its type.

use serde_json::Value;

pub const UNKNOWN: &str = "Unknown";

pub fn str_or<'a>(value: &'a Value, key: &str, default: &'a str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or(default)
}

pub fn string_or_empty(value: &Value, key: &str) -> String {
    str_or(value, key, "").to_string()
}

pub fn u64_or_zero(value: &Value, key: &str) -> u64 {
    match value.get(key) {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

pub fn f64_or_zero(value: &Value, key: &str) -> f64 {
    match value.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// `true` and `"true"` both count; anything else is false.
pub fn flag(value: &Value, key: &str) -> bool {
    match value.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

pub fn attributes(resource: &Value) -> &Value {
    resource.get("attributes").unwrap_or(&Value::Null)
}

pub fn resource_id(resource: &Value) -> Option<&str> {
    resource
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
}

/// Ids of `relationships.<name>.data[]`, in payload order.
pub fn relationship_ids<'a>(resource: &'a Value, name: &str) -> Vec<&'a str> {
    match resource
        .get("relationships")
        .and_then(|r| r.get(name))
        .and_then(|r| r.get("data"))
    {
        Some(Value::Array(refs)) => refs.iter().filter_map(resource_id).collect(),
        Some(single @ Value::Object(_)) => resource_id(single).into_iter().collect(),
        _ => Vec::new(),
    }
}

/// Top-level `data` as a list, whether upstream sent one object or an array.
pub fn data_items(document: &Value) -> Vec<&Value> {
    match document.get("data") {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(item @ Value::Object(_)) => vec![item],
        _ => Vec::new(),
    }
}

pub fn included_of_type<'a>(document: &'a Value, kind: &'a str) -> impl Iterator<Item = &'a Value> {
    document
        .get("included")
        .and_then(Value::as_array)
        .map(|items| items.as_slice())
        .unwrap_or_default()
        .iter()
        .filter(move |item| item.get("type").and_then(Value::as_str) == Some(kind))
}
