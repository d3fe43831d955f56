//! Pulls the analysis JSON out of free-form model output.
//!
//! Models do not always emit bare JSON; they wrap it in prose or code fences.
//! The object is sliced from the first `{` to the last `}` before parsing.
//! Without braces the raw text goes to the parser unchanged, which fails on
//! anything that is not JSON.

use serde_json::{Map, Value};
use vtrack_models::AnalysisResult;

use crate::error::{AnalysisError, GeminiResult};

/// Slice from the first `{` to the last `}`, or the whole text.
pub fn json_object_span(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => text,
    }
}

/// Parse model output into an [`AnalysisResult`].
///
/// Absent or null fields become empty strings; other scalars are rendered
/// with their JSON text.
pub fn parse_analysis(text: &str) -> GeminiResult<AnalysisResult> {
    let span = json_object_span(text.trim());

    let value: Value = serde_json::from_str(span)
        .map_err(|e| AnalysisError::parse(format!("model output is not valid JSON: {}", e), text))?;

    let object = value.as_object().ok_or_else(|| {
        AnalysisError::parse(
            format!("expected a JSON object, got {}", json_type(&value)),
            text,
        )
    })?;

    Ok(AnalysisResult {
        summary: field(object, "summary"),
        mood: field(object, "mood"),
        title: field(object, "title"),
        music_prompt: field(object, "music_prompt"),
    })
}

fn field(object: &Map<String, Value>, name: &str) -> String {
    match object.get(name) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prose_wrapped_json() {
        let text = r#"Sure! {"summary":"s","mood":"m","title":"t","music_prompt":"p"} Hope that helps."#;
        let result = parse_analysis(text).unwrap();
        assert_eq!(
            result,
            AnalysisResult {
                summary: "s".into(),
                mood: "m".into(),
                title: "t".into(),
                music_prompt: "p".into(),
            }
        );
    }

    #[test]
    fn test_code_fenced_json() {
        let text = "```json\n{\"summary\":\"a\",\"mood\":\"b\",\"title\":\"c\",\"music_prompt\":\"d\"}\n```";
        assert_eq!(parse_analysis(text).unwrap().mood, "b");
    }

    #[test]
    fn test_nested_braces_keep_outer_object() {
        let text = r#"{"summary":"uses {braces}","mood":"m","extra":{"k":1}}"#;
        let result = parse_analysis(text).unwrap();
        assert_eq!(result.summary, "uses {braces}");
        assert_eq!(result.title, "");
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let result = parse_analysis(r#"{"title":"Only"}"#).unwrap();
        assert_eq!(result.title, "Only");
        assert_eq!(result.summary, "");
        assert_eq!(result.mood, "");
        assert_eq!(result.music_prompt, "");
    }

    #[test]
    fn test_null_and_scalar_fields() {
        let result = parse_analysis(r#"{"summary":null,"mood":7,"title":true}"#).unwrap();
        assert_eq!(result.summary, "");
        assert_eq!(result.mood, "7");
        assert_eq!(result.title, "true");
    }

    #[test]
    fn test_no_braces_is_parse_error_with_raw_text() {
        let err = parse_analysis("I cannot help with that.").unwrap_err();
        assert!(matches!(err, AnalysisError::Parse { .. }));
        assert_eq!(err.raw_text(), Some("I cannot help with that."));
    }

    #[test]
    fn test_array_is_rejected() {
        let err = parse_analysis(r#"["summary","mood"]"#).unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_span_without_closing_brace() {
        assert_eq!(json_object_span("abc { def"), "abc { def");
        assert_eq!(json_object_span("} reversed {"), "} reversed {");
        assert_eq!(json_object_span("x {} y"), "{}");
    }
}
