//! Shape classification for structured input.

use serde_json::Value;

/// A many-load input must be a JSON array. Strings and objects are not
/// collections even though they are iterable in some sense.
pub fn is_collection(data: &Value) -> bool {
    data.is_array()
}

/// A single-load input must be a JSON object.
pub fn is_mapping(data: &Value) -> bool {
    data.is_object()
}

/// Empty-ish discriminator values that count as missing: `null`, `false`,
/// zero, the empty string, and empty arrays or objects.
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Values that cannot serve as a registry key.
pub fn is_unhashable(value: &Value) -> bool {
    matches!(value, Value::Array(_) | Value::Object(_))
}

/// Render a value for an error message: strings bare, everything else as JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
