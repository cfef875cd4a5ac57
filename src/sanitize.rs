use serde_json::Value;

use crate::error::HunterError;

const PREVIEW_CHARS: usize = 200;

pub fn strip_code_fences(raw: &str) -> String {
    raw.trim()
        .replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

pub fn parse_json_array(raw: &str) -> Result<Vec<Value>, HunterError> {
    let cleaned = strip_code_fences(raw);
    match serde_json::from_str::<Value>(&cleaned) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(other) => Err(HunterError::Parse(format!(
            "expected JSON array, got {} (payload: {})",
            json_kind(&other),
            preview(&cleaned)
        ))),
        Err(err) => Err(HunterError::Parse(format!(
            "{} (payload: {})",
            err,
            preview(&cleaned)
        ))),
    }
}

pub fn preview(raw: &str) -> String {
    let mut chars = raw.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}…", head)
    } else {
        head
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
