//! Wire types for the `generateContent` endpoint.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

/// One conversational turn.
#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

/// A request segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Part {
    Text(String),
    InlineData(InlineData),
    FileData(FileData),
}

impl Part {
    /// True for media-carrying parts.
    pub fn is_media(&self) -> bool {
        !matches!(self, Part::Text(_))
    }
}

/// Base64 media embedded in the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// Media passed by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub file_uri: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    pub response_schema: Value,
}

impl GenerationConfig {
    /// JSON output constrained to the four analysis fields.
    pub fn analysis() -> Self {
        Self {
            response_mime_type: "application/json".to_string(),
            response_schema: analysis_schema(),
        }
    }
}

/// Response schema: an object with four required string fields.
pub fn analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": { "type": "STRING" },
            "mood": { "type": "STRING" },
            "title": { "type": "STRING" },
            "music_prompt": { "type": "STRING" }
        },
        "required": ["summary", "mood", "title", "music_prompt"]
    })
}

/// Response envelope.
#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Text at `candidates[0].content.parts[0].text`.
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .and_then(|p| p.text.as_deref())
    }
}
