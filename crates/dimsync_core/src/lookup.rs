//! Safe navigation over loosely shaped JSON records.
//!
//! Upstream records are heterogeneous: a field may be missing, hold a string
//! where a number is expected, or be a list where a mapping is expected. Every
//! accessor here resolves those cases to an empty/default value instead of
//! failing.

use serde_json::Value;

/// Follows `path` through nested objects. Any non-object hop yields `None`.
pub fn get_path<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(value, |current, key| current.as_object()?.get(*key))
}

/// Text of a scalar value. Objects, arrays and null have no text.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Text at `path`, or an empty string.
pub fn text_at(value: &Value, path: &[&str]) -> String {
    get_path(value, path)
        .and_then(scalar_text)
        .unwrap_or_default()
}

/// Integer at `path`, or `0`.
///
/// Accepts JSON numbers and numeric strings such as `"12"` or `"12.000"`;
/// the fractional part is truncated.
pub fn int_at(value: &Value, path: &[&str]) -> i64 {
    get_path(value, path).and_then(as_int).unwrap_or(0)
}

fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(|f| f.trunc() as i64))
        }
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Truthiness at `path`: `true`, non-zero numbers and `"1"`/`"true"` count.
pub fn flag_at(value: &Value, path: &[&str]) -> bool {
    match get_path(value, path) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) if s.trim().eq_ignore_ascii_case("true") => true,
        Some(other) => as_int(other).is_some_and(|n| n != 0),
        None => false,
    }
}

/// Non-empty scalar text stored under `group` / `field` of an attribute map.
///
/// A group that is not itself a mapping is treated as absent.
pub fn attribute_value(attributes: &Value, group: &str, field: &str) -> Option<String> {
    get_path(attributes, &[group, field])
        .and_then(scalar_text)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Every scalar leaf under `value`, depth first, in document order.
pub fn leaf_texts(value: &Value) -> Vec<String> {
    let mut out = Vec::new();
    collect_leaves(value, &mut out);
    out
}

fn collect_leaves(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => map.values().for_each(|v| collect_leaves(v, out)),
        Value::Array(items) => items.iter().for_each(|v| collect_leaves(v, out)),
        other => out.extend(scalar_text(other)),
    }
}
