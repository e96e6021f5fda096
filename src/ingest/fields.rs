//! Coercion of loosely-typed post fields.
//!
//! Clients send `faculties` and `metadata` either as structured JSON or as
//! JSON-encoded strings (multipart forms only carry text). None of these
//! conversions fail: bad input degrades to a fallback value.

use chrono::Utc;
use serde_json::Value;

/// Normalize `faculties` into a list of names.
///
/// Priority: a JSON array, then a string holding a JSON array, then the
/// string split on commas with each piece trimmed.
pub fn faculties(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().map(stringify).collect(),
        Some(Value::String(raw)) if !raw.trim().is_empty() => {
            match serde_json::from_str::<Value>(raw) {
                Ok(Value::Array(items)) => items.iter().map(stringify).collect(),
                Ok(_) | Err(_) => {
                    tracing::debug!(faculties = %raw, "faculties is not a JSON array, splitting on commas");
                    split_list(raw)
                }
            }
        }
        _ => Vec::new(),
    }
}

/// Normalize `metadata`. Strings are parsed as JSON; unparseable or blank
/// strings and `null` yield `None`.
pub fn metadata(value: Option<Value>) -> Option<Value> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(raw)) => {
            if raw.trim().is_empty() {
                return None;
            }
            match serde_json::from_str(&raw) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    tracing::warn!(error = %e, "Dropping metadata that is not valid JSON");
                    None
                }
            }
        }
        Some(other) => Some(other),
    }
}

/// Sport name as free text. Missing values become an empty string.
pub fn sport(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(v) => stringify(v),
    }
}

/// The client's timestamp if it is truthy, otherwise now in epoch millis.
pub fn timestamp(value: Option<Value>) -> Value {
    match value {
        Some(v) if is_truthy(&v) => v,
        _ => Value::from(Utc::now().timestamp_millis()),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
