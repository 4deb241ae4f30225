use super::ClassifierError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"\\]+)""#).expect("static pattern compiles"));

/// Extracts the list of names from a classifier reply.
///
/// Accepts a JSON array of strings or a JSON object with exactly one
/// array-valued field, optionally wrapped in a Markdown code fence. Anything
/// else falls back to collecting double-quoted substrings.
pub fn parse_classifier_reply(content: &str) -> Result<Vec<String>, ClassifierError> {
    let body = strip_code_fence(content.trim());

    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(names) = names_from_json(&value) {
            return Ok(names);
        }
    }

    let quoted: Vec<String> = QUOTED
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();

    if quoted.is_empty() {
        let preview: String = body.chars().take(80).collect();
        Err(ClassifierError::Parse(preview))
    } else {
        Ok(quoted)
    }
}

fn names_from_json(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(string_items(items)),
        Value::Object(fields) => {
            let mut arrays = fields.values().filter_map(Value::as_array);
            match (arrays.next(), arrays.next()) {
                (Some(items), None) => Some(string_items(items)),
                _ => None,
            }
        }
        _ => None,
    }
}

fn string_items(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(Value::as_str)
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

fn strip_code_fence(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("```") else {
        return content;
    };
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
