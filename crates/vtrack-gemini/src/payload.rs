//! Request assembly for multimodal analysis.
//!
//! Pure data assembly: no I/O, deterministic for identical inputs.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use vtrack_models::MediaRef;

use crate::types::{FileData, InlineData, Part};

/// Fixed instruction describing the required output.
pub const SYSTEM_INSTRUCTION: &str = r#"You are a film composer's assistant. Analyze the provided material (video and/or script) and describe the soundtrack it needs.

Return ONLY a single JSON object with exactly these string fields:
{
  "summary": "Two or three sentences describing what happens",
  "mood": "The dominant emotional tone, a few words",
  "title": "A short evocative title for the soundtrack",
  "music_prompt": "A description of the music for a generation model: genre, instrumentation, tempo, dynamics and how it evolves. At most 450 characters."
}

Do not wrap the JSON in markdown or add commentary."#;

/// Sent in place of the script when none was provided.
pub const NO_SCRIPT_PLACEHOLDER: &str =
    "No script was provided. Base the analysis solely on the attached media.";

/// Media segment of a request before transport decisions are made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaPart {
    /// Already encoded bytes.
    Inline(InlineData),
    /// URL passed through unchanged; the client decides how to deliver it.
    Reference { url: String },
}

/// Assembled request parts, in send order: media, instruction, script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestParts {
    pub media: Option<MediaPart>,
    pub instruction: String,
    pub script: String,
}

impl RequestParts {
    /// Swap the media segment, e.g. after fetching a referenced URL.
    pub fn with_media(mut self, media: Option<MediaPart>) -> Self {
        self.media = media;
        self
    }

    /// URL awaiting resolution, if any.
    pub fn media_reference(&self) -> Option<&str> {
        match &self.media {
            Some(MediaPart::Reference { url }) => Some(url),
            _ => None,
        }
    }

    /// Wire parts. A pending reference is forwarded as `fileData`.
    pub fn to_parts(&self) -> Vec<Part> {
        let mut parts = Vec::with_capacity(3);
        match &self.media {
            Some(MediaPart::Inline(data)) => parts.push(Part::InlineData(data.clone())),
            Some(MediaPart::Reference { url }) => parts.push(Part::FileData(FileData {
                mime_type: None,
                file_uri: url.clone(),
            })),
            None => {}
        }
        parts.push(Part::Text(self.instruction.clone()));
        parts.push(Part::Text(self.script.clone()));
        parts
    }
}

/// Builds [`RequestParts`] from raw inputs.
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    instruction: String,
}

impl Default for PayloadBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadBuilder {
    pub fn new() -> Self {
        Self {
            instruction: SYSTEM_INSTRUCTION.to_string(),
        }
    }

    /// Use a custom instruction instead of the built-in one.
    pub fn with_instruction(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
        }
    }

    /// Assemble the parts. The caller has already checked that at least one
    /// of script or media is present.
    pub fn build(&self, script_text: &str, media: Option<&MediaRef>) -> RequestParts {
        let media = media.map(|m| match m {
            MediaRef::Inline { bytes, mime_type } => MediaPart::Inline(encode_inline(bytes, mime_type)),
            MediaRef::Url { url } => MediaPart::Reference { url: url.clone() },
        });

        let script = if script_text.trim().is_empty() {
            NO_SCRIPT_PLACEHOLDER.to_string()
        } else {
            script_text.to_string()
        };

        RequestParts {
            media,
            instruction: self.instruction.clone(),
            script,
        }
    }
}

/// Base64-encode media bytes, keeping the MIME type.
pub fn encode_inline(bytes: &[u8], mime_type: &str) -> InlineData {
    InlineData {
        mime_type: mime_type.to_string(),
        data: BASE64.encode(bytes),
    }
}
