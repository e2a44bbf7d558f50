//! Field value normalizers
//!
//! All normalizers operate on the textual form of a value. Numbers are
//! stringified first; anything else (arrays, objects, booleans, null) has
//! no textual form and is treated as absent.

use serde_json::Value;

/// Extract the textual form of a field value.
///
/// Strings are trimmed; empty strings count as absent. Numbers are
/// stringified. Everything else is absent.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Extract an integer from a field value, accepting numeric strings.
pub fn value_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Capitalize the first letter and lower-case the rest (`yes` → `Yes`).
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}

/// Coerce a date-only value to a full date-time.
///
/// Values already carrying a time component pass through unchanged; this
/// rule applies uniformly to every date field across categories.
pub fn normalize_datetime(text: &str) -> String {
    if text.contains('T') {
        text.to_string()
    } else {
        format!("{text}T00:00:00.000Z")
    }
}

/// Replace a free-text value with its canonical display form.
///
/// The lookup is on the lower-cased value; unmapped values fall back to
/// [`capitalize`] rather than being rejected.
pub fn vocabulary(table: &[(&str, &str)], text: &str) -> String {
    let key = text.trim().to_lowercase();
    table
        .iter()
        .find(|(from, _)| *from == key)
        .map(|(_, to)| to.to_string())
        .unwrap_or_else(|| capitalize(text))
}

/// Like [`vocabulary`], but unmapped values become a fixed default.
pub fn vocabulary_or(table: &[(&str, &str)], default: &str, text: &str) -> String {
    let key = text.trim().to_lowercase();
    table
        .iter()
        .find(|(from, _)| *from == key)
        .map(|(_, to)| to.to_string())
        .unwrap_or_else(|| default.to_string())
}
