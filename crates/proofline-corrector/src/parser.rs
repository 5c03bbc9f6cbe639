//! Parse backend replies into corrections
//!
//! Backends are asked for a bare JSON array but often wrap it in a code fence
//! or surround it with prose. The parser tries, in order:
//!
//! 1. the reply with any markdown fence removed, as JSON
//! 2. every balanced `[...]` or `{...}` span in the reply, first match wins
//!
//! A single correction object is accepted in place of an array, and so is an
//! object holding the array under `corrections`.

use proofline_domain::Correction;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Keys accepted for the original text; `theorigin` is an older spelling
const ORIGINAL_KEYS: &[&str] = &["original", "theorigin"];

/// Parse a backend reply for the unit at `unit_index`
///
/// No-op items and items without text fields are dropped with a warning.
/// `Ok(vec![])` means the backend found nothing to correct.
///
/// # Errors
///
/// Returns a description of the reply when nothing correction-shaped is found.
pub fn parse_corrections(response: &str, unit_index: usize) -> Result<Vec<Correction>, String> {
    let stripped = strip_code_fence(response);

    if let Ok(value) = serde_json::from_str::<Value>(stripped) {
        if let Some(corrections) = corrections_from_value(&value, unit_index) {
            return Ok(corrections);
        }
    }

    for candidate in balanced_spans(stripped) {
        let Ok(value) = serde_json::from_str::<Value>(candidate) else {
            continue;
        };
        if let Some(corrections) = corrections_from_value(&value, unit_index) {
            debug!("Recovered corrections from a {} byte span of the reply", candidate.len());
            return Ok(corrections);
        }
    }

    Err(format!("no corrections found in reply: {}", preview(response)))
}

/// Remove a surrounding markdown code fence, if any
fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the language tag line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Convert a JSON value into corrections, or `None` if it is not correction-shaped
fn corrections_from_value(value: &Value, unit_index: usize) -> Option<Vec<Correction>> {
    match value {
        Value::Array(items) if items.is_empty() => Some(Vec::new()),
        Value::Array(items) => {
            if !items.iter().any(|item| item.as_object().is_some_and(has_text_fields)) {
                return None;
            }
            let corrections = items
                .iter()
                .enumerate()
                .filter_map(|(position, item)| correction_from_item(item, position, unit_index))
                .collect();
            Some(corrections)
        }
        Value::Object(map) if has_text_fields(map) => {
            Some(correction_from_item(value, 0, unit_index).into_iter().collect())
        }
        Value::Object(map) => match map.get("corrections") {
            Some(inner @ Value::Array(_)) => corrections_from_value(inner, unit_index),
            _ => None,
        },
        _ => None,
    }
}

fn has_text_fields(map: &Map<String, Value>) -> bool {
    ORIGINAL_KEYS.iter().any(|key| map.contains_key(*key)) && map.contains_key("corrected")
}

fn correction_from_item(item: &Value, position: usize, unit_index: usize) -> Option<Correction> {
    let Some(map) = item.as_object() else {
        warn!("Skipping item {} of unit {}: not an object", position, unit_index + 1);
        return None;
    };

    let original = ORIGINAL_KEYS
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str));
    let corrected = map.get("corrected").and_then(Value::as_str);

    let (Some(original), Some(corrected)) = (original, corrected) else {
        warn!(
            "Skipping item {} of unit {}: missing or invalid 'original'/'corrected'",
            position,
            unit_index + 1
        );
        return None;
    };

    let mut correction = Correction::new(unit_index, original, corrected);
    if let Some(reason) = map.get("reason").and_then(Value::as_str) {
        if !reason.trim().is_empty() {
            correction = correction.with_reason(reason.trim());
        }
    }

    if correction.is_noop() {
        warn!("Skipping item {} of unit {}: correction changes nothing", position, unit_index + 1);
        return None;
    }

    Some(correction)
}

/// Every balanced bracket span, in order of its opening bracket
///
/// Brackets inside JSON strings are ignored, escapes included.
fn balanced_spans(text: &str) -> impl Iterator<Item = &str> {
    let bytes = text.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|(_, b)| matches!(b, b'[' | b'{'))
        .filter_map(move |(start, _)| balanced_end(bytes, start).map(|end| &text[start..=end]))
}

fn balanced_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut expected = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'[' => expected.push(b']'),
            b'{' => expected.push(b'}'),
            b']' | b'}' => {
                if expected.pop() != Some(byte) {
                    return None;
                }
                if expected.is_empty() {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }

    None
}

fn preview(response: &str) -> String {
    let trimmed = response.trim();
    let mut preview: String = trimmed.chars().take(120).collect();
    if preview.len() < trimmed.len() {
        preview.push_str("...");
    }
    preview
}
