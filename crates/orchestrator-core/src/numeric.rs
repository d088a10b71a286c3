//! Lenient numeric coercion for map payloads.
//!
//! The map backend reports most numbers as strings (`"1203"`, `"2.0"`) and uses
//! an empty array where a value is absent, so every numeric read goes through
//! [`safe_int`] instead of failing the whole render.

use serde_json::Value;

/// Parse a JSON number or numeric string, truncating decimals; anything else is 0.
pub fn safe_int(value: Option<&Value>) -> i64 {
    parse_int(value).unwrap_or(0)
}

/// Like [`safe_int`] but distinguishes "missing or malformed" from zero.
pub fn parse_int(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        _ => None,
    }
}

/// Seconds to whole minutes for display: at least one minute when positive, else 0.
pub fn display_minutes(value: Option<&Value>) -> i64 {
    let seconds = safe_int(value);
    if seconds > 0 { (seconds / 60).max(1) } else { 0 }
}

/// True when the value exists and is not null, false, zero, or empty.
pub fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

/// Non-empty string field; the backend's `[]` placeholder reads as absent.
pub fn text(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.trim().is_empty())
}
