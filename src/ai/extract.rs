//! Pulls the JSON payload out of a model reply. Models wrap it in prose
//! and a ```json fenced block; only the first such block is used.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static JSON_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json[ \t]*\r?\n?(.*?)```").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Parsed(Value),
    /// No fenced json block in the text
    Missing,
    /// A block was found but it isn't valid JSON
    Malformed { json: String, error: String },
}

pub fn extract_json(text: &str) -> Extraction {
    let Some(block) = JSON_BLOCK.captures(text).and_then(|c| c.get(1)) else {
        return Extraction::Missing;
    };
    let json = block.as_str().trim();
    match serde_json::from_str::<Value>(json) {
        Ok(value) => Extraction::Parsed(value),
        Err(e) => Extraction::Malformed {
            json: json.to_string(),
            error: e.to_string(),
        },
    }
}

/// Flatten the payload into a list of event objects. A lone object is
/// treated as a list of one.
pub fn into_items(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(_) => vec![value],
        other => {
            tracing::warn!("Expected a JSON array or object of events, got: {}", other);
            vec![]
        }
    }
}
