//! Music API request/response types.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// What a caller asks the music service to produce.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Free-text music description
    pub prompt: String,
    /// No vocals
    pub instrumental: bool,
    /// Track title (enables custom mode)
    pub title: Option<String>,
    /// Style tags (enables custom mode)
    pub style: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            instrumental: true,
            title: None,
            style: None,
        }
    }

    pub fn instrumental(mut self, instrumental: bool) -> Self {
        self.instrumental = instrumental;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into()).filter(|t: &String| !t.trim().is_empty());
        self
    }

    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into()).filter(|s: &String| !s.trim().is_empty());
        self
    }

    /// Custom mode is used whenever a title or style is supplied.
    pub fn custom_mode(&self) -> bool {
        self.title.is_some() || self.style.is_some()
    }
}

/// Kind of job being tracked; selects the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Music generation
    Music,
    /// WAV conversion of a generated track
    WavConversion,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Music => "music",
            TaskKind::WavConversion => "wav_conversion",
        }
    }

    /// Status endpoint path.
    pub fn status_path(&self) -> &'static str {
        match self {
            TaskKind::Music => "/api/v1/generate/record-info",
            TaskKind::WavConversion => "/api/v1/wav/record-info",
        }
    }
}

/// Body of `POST /api/v1/generate`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBody<'a> {
    pub prompt: &'a str,
    pub custom_mode: bool,
    pub instrumental: bool,
    pub model: &'a str,
    pub call_back_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<&'a str>,
}

/// Body of `POST /api/v1/wav/generate`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WavBody<'a> {
    pub task_id: &'a str,
    pub audio_id: &'a str,
    pub call_back_url: &'a str,
}

/// Common response envelope: `{code, msg, data}`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitData {
    #[serde(default)]
    pub task_id: Option<String>,
}

/// Payload of a status query.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusData {
    #[serde(default)]
    pub task_id: Option<String>,
    /// Status on the music endpoint
    #[serde(default)]
    pub status: Option<String>,
    /// Status on the WAV endpoint; string or number depending on version
    #[serde(default)]
    pub success_flag: Option<Value>,
    #[serde(default)]
    pub response: Option<ProviderResponse>,
    #[serde(default)]
    pub error_code: Option<Value>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl StatusData {
    /// The status string, whichever field carries it.
    pub fn effective_status(&self) -> String {
        if let Some(status) = self.status.as_deref().filter(|s| !s.trim().is_empty()) {
            return status.trim().to_string();
        }
        match &self.success_flag {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }

    /// Human-readable reason for a failed task.
    pub fn failure_message(&self, fallback: &str) -> String {
        if let Some(message) = self.error_message.as_deref().filter(|m| !m.trim().is_empty()) {
            return message.to_string();
        }
        match &self.error_code {
            Some(Value::Null) | None => fallback.to_string(),
            Some(Value::String(code)) => format!("error code {}", code),
            Some(code) => format!("error code {}", code),
        }
    }
}

/// Known shapes of `data.response`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ProviderResponse {
    /// Music generation: list of tracks
    Tracks {
        #[serde(
            rename = "sunoData",
            alias = "suno_data",
            deserialize_with = "lenient_tracks"
        )]
        tracks: Vec<TrackEntry>,
    },
    /// WAV conversion: single file
    Wav {
        #[serde(rename = "audioWavUrl", alias = "audio_wav_url")]
        audio_wav_url: String,
    },
    /// Anything else, e.g. `sunoData: null` while pending
    Unknown(Value),
}

/// One track as reported by the provider.
///
/// Field names drift across API versions, so the id and audio URL are
/// collected from every location seen so far. A field of the wrong type
/// reads as absent; numeric ids and durations sent as strings are accepted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub track_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub audio_id: Option<String>,
    #[serde(default, alias = "audio_url", deserialize_with = "lenient_string")]
    pub audio_url: Option<String>,
    #[serde(default, alias = "source_audio_url", deserialize_with = "lenient_string")]
    pub source_audio_url: Option<String>,
    #[serde(default, alias = "image_url", deserialize_with = "lenient_string")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub prompt: Option<String>,
    #[serde(default, alias = "model_name", deserialize_with = "lenient_string")]
    pub model_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tags: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub duration: Option<f64>,
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Decodes each entry on its own; entries that are not objects are dropped.
/// Anything other than an array is rejected so the response falls through
/// to `Unknown`.
fn lenient_tracks<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<TrackEntry>, D::Error> {
    match Value::deserialize(d)? {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect()),
        other => Err(D::Error::custom(format!(
            "expected a track list, found {}",
            other
        ))),
    }
}
