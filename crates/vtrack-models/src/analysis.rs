//! Analysis request and result models.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Errors raised when a media reference is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaRefError {
    #[error("Inline media is empty")]
    EmptyBytes,

    #[error("Inline media has no MIME type")]
    MissingMimeType,

    #[error("Invalid media URL '{0}': {1}")]
    InvalidUrl(String, String),

    #[error("Unsupported media URL scheme: {0}")]
    UnsupportedScheme(String),
}

/// Reference to the media that accompanies an analysis request.
///
/// Either the raw bytes with their MIME type, or a publicly reachable URL
/// (typically produced by the blob upload step).
#[derive(Clone, PartialEq, Eq)]
pub enum MediaRef {
    /// Raw media bytes, sent inline as base64.
    Inline { bytes: Vec<u8>, mime_type: String },
    /// Media hosted elsewhere.
    Url { url: String },
}

impl MediaRef {
    /// Create an inline media reference.
    pub fn inline(bytes: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self::Inline {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Create a URL media reference.
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url { url: url.into() }
    }

    /// Check the reference is usable before any I/O happens.
    pub fn validate(&self) -> Result<(), MediaRefError> {
        match self {
            MediaRef::Inline { bytes, mime_type } => {
                if bytes.is_empty() {
                    return Err(MediaRefError::EmptyBytes);
                }
                if mime_type.trim().is_empty() {
                    return Err(MediaRefError::MissingMimeType);
                }
                Ok(())
            }
            MediaRef::Url { url } => {
                let parsed = Url::parse(url)
                    .map_err(|e| MediaRefError::InvalidUrl(url.clone(), e.to_string()))?;
                match parsed.scheme() {
                    "http" | "https" | "gs" => Ok(()),
                    other => Err(MediaRefError::UnsupportedScheme(other.to_string())),
                }
            }
        }
    }

    /// MIME type if known up front.
    pub fn mime_type(&self) -> Option<&str> {
        match self {
            MediaRef::Inline { mime_type, .. } => Some(mime_type),
            MediaRef::Url { .. } => None,
        }
    }
}

impl fmt::Debug for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaRef::Inline { bytes, mime_type } => f
                .debug_struct("Inline")
                .field("len", &bytes.len())
                .field("mime_type", mime_type)
                .finish(),
            MediaRef::Url { url } => f.debug_struct("Url").field("url", url).finish(),
        }
    }
}

/// Input to the analysis step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisRequest {
    /// Script text, may be empty
    pub script_text: String,
    /// Optional accompanying media
    pub media: Option<MediaRef>,
}

impl AnalysisRequest {
    /// Create a new request.
    pub fn new(script_text: impl Into<String>, media: Option<MediaRef>) -> Self {
        Self {
            script_text: script_text.into(),
            media,
        }
    }

    /// Request with script text only.
    pub fn script(script_text: impl Into<String>) -> Self {
        Self::new(script_text, None)
    }

    /// True when the script contains something other than whitespace.
    pub fn has_script(&self) -> bool {
        !self.script_text.trim().is_empty()
    }

    /// At least one of script or media must be present.
    pub fn has_input(&self) -> bool {
        self.has_script() || self.media.is_some()
    }
}

/// Structured analysis produced by the language model.
///
/// Every field is always a string; fields the model omitted are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Short description of the content
    #[serde(default)]
    pub summary: String,

    /// Emotional tone
    #[serde(default)]
    pub mood: String,

    /// Suggested track title
    #[serde(default)]
    pub title: String,

    /// Prompt for the music generator (about 450 characters by convention)
    #[serde(default)]
    pub music_prompt: String,
}

impl AnalysisResult {
    /// Field names the model is asked to produce.
    pub const FIELDS: [&'static str; 4] = ["summary", "mood", "title", "music_prompt"];

    /// True when every field is empty.
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty()
            && self.mood.is_empty()
            && self.title.is_empty()
            && self.music_prompt.is_empty()
    }
}
