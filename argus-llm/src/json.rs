use regex::Regex;
use serde_json::Value;

use crate::error::LlmError;

/// Extract the first JSON object or array from model output.
///
/// Models wrap JSON in prose or markdown fences no matter how strictly the
/// prompt forbids it; this strips ```` ```json ```` fences first and then
/// takes the widest `{…}` or `[…]` span.
pub fn extract_json(text: &str) -> Result<Value, LlmError> {
    let trimmed = strip_fences(text.trim());

    let re = Regex::new(r"(?s)(\{.*\}|\[.*\])")
        .map_err(|e| LlmError::Parse(e.to_string()))?;
    let captured = re
        .find(trimmed)
        .ok_or_else(|| LlmError::Parse("no JSON found in model output".to_owned()))?;

    serde_json::from_str(captured.as_str()).map_err(|e| {
        LlmError::Parse(format!(
            "failed to parse model output as JSON: {e}. Raw content: {}",
            &trimmed.chars().take(400).collect::<String>()
        ))
    })
}

fn strip_fences(text: &str) -> &str {
    if !text.starts_with("```") {
        return text;
    }
    let without_opening = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    without_opening
        .strip_suffix("```")
        .unwrap_or(without_opening)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_object() {
        let v = extract_json(r#"{"intent":"WAIT"}"#).unwrap();
        assert_eq!(v, json!({"intent": "WAIT"}));
    }

    #[test]
    fn object_in_prose() {
        let v = extract_json("Sure! Here is the plan: {\"x\": 1} hope that helps").unwrap();
        assert_eq!(v, json!({"x": 1}));
    }

    #[test]
    fn fenced_json() {
        let v = extract_json("```json\n[{\"a\":1}]\n```").unwrap();
        assert_eq!(v, json!([{"a": 1}]));
    }

    #[test]
    fn fenced_without_language_tag() {
        let v = extract_json("```\n{\"b\":2}\n```").unwrap();
        assert_eq!(v, json!({"b": 2}));
    }

    #[test]
    fn no_json_is_an_error() {
        assert!(matches!(
            extract_json("I cannot answer that."),
            Err(LlmError::Parse(_))
        ));
    }

    #[test]
    fn arrays_spanning_lines() {
        let text = "[\n  {\"thought\": \"a\"},\n  {\"thought\": \"b\"}\n]";
        let v = extract_json(text).unwrap();
        assert_eq!(v.as_array().unwrap().len(), 2);
    }
}
