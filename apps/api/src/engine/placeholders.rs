//! Placeholder resolution — `{{dotted.path}}` lookup against a JSON data bag.
//!
//! Missing keys are never an error: an unresolved token is left in the output
//! verbatim so drafts stay reviewable and the gap stays visible.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

static PLACEHOLDER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([^}]+)\}\}").expect("placeholder pattern is valid"));

/// Walks `path` (split on `.`) through nested objects. Numeric segments also
/// index into arrays. Returns `None` if any segment is missing or the final
/// value is `null`.
pub fn resolve<'a>(bag: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.trim();
    if path.is_empty() {
        return None;
    }

    let mut current = bag;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// Resolves `path` and formats it for display.
pub fn resolve_display(bag: &Value, path: &str) -> Option<String> {
    resolve(bag, path).map(display_value)
}

/// Replaces every `{{key}}` token in `text` with its resolved value.
/// Unresolved tokens are preserved exactly as written.
pub fn replace_placeholders(text: &str, bag: &Value) -> String {
    PLACEHOLDER_PATTERN
        .replace_all(text, |caps: &Captures| match resolve(bag, &caps[1]) {
            Some(value) => display_value(value),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Returns every placeholder key referenced in `text`, trimmed, in first-seen order.
pub fn extract_placeholder_keys(text: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for caps in PLACEHOLDER_PATTERN.captures_iter(text) {
        let key = caps[1].trim();
        if !key.is_empty() && !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    }
    keys
}

/// Formats a JSON value for substitution into document text.
///
/// - Strings: verbatim
/// - Numbers: integral values without a fractional part (`900000`, not `900000.0`)
/// - Booleans: `true` / `false`
/// - Arrays: elements joined with `", "`
/// - Objects: compact JSON
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                n.to_string()
            } else {
                n.as_f64().map(format_number).unwrap_or_else(|| n.to_string())
            }
        }
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
