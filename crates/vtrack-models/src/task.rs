//! Generation task models.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Title used when the provider reports none.
pub const DEFAULT_TRACK_TITLE: &str = "Untitled Track";

/// Opaque identifier issued by the music service for one submitted job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Status of a single produced track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackStatus {
    Pending,
    Success,
    Failure,
}

impl TrackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackStatus::Pending => "PENDING",
            TrackStatus::Success => "SUCCESS",
            TrackStatus::Failure => "FAILURE",
        }
    }
}

impl fmt::Display for TrackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One produced track.
///
/// Immutable once created. The status is derived from the audio URL so that
/// `Success` always carries a non-empty URL and `Failure` never carries one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationTask {
    id: String,
    status: TrackStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio_url: Option<String>,
    title: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

impl GenerationTask {
    /// Create a task record.
    ///
    /// * `audio_url` - a non-empty URL makes the task `Success`
    /// * `failed` - without audio, marks the task `Failure` instead of `Pending`
    pub fn new(
        id: impl Into<String>,
        audio_url: Option<String>,
        failed: bool,
        title: Option<String>,
        prompt: impl Into<String>,
    ) -> Self {
        let audio_url = audio_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        let status = match (&audio_url, failed) {
            (Some(_), _) => TrackStatus::Success,
            (None, true) => TrackStatus::Failure,
            (None, false) => TrackStatus::Pending,
        };

        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TRACK_TITLE.to_string());

        Self {
            id: id.into(),
            status,
            audio_url,
            title,
            prompt: prompt.into(),
            image_url: None,
            model_name: None,
            tags: None,
            duration_secs: None,
        }
    }

    /// Attach cover art.
    pub fn with_image_url(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url.filter(|u| !u.is_empty());
        self
    }

    /// Attach the generating model's name.
    pub fn with_model_name(mut self, model_name: Option<String>) -> Self {
        self.model_name = model_name.filter(|m| !m.is_empty());
        self
    }

    /// Attach style tags.
    pub fn with_tags(mut self, tags: Option<String>) -> Self {
        self.tags = tags.filter(|t| !t.is_empty());
        self
    }

    /// Attach the track duration.
    pub fn with_duration(mut self, duration_secs: Option<f64>) -> Self {
        self.duration_secs = duration_secs.filter(|d| d.is_finite() && *d > 0.0);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> TrackStatus {
        self.status
    }

    pub fn audio_url(&self) -> Option<&str> {
        self.audio_url.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model_name.as_deref()
    }

    pub fn tags(&self) -> Option<&str> {
        self.tags.as_deref()
    }

    pub fn duration_secs(&self) -> Option<f64> {
        self.duration_secs
    }

    /// True when the track can be played.
    pub fn is_playable(&self) -> bool {
        self.status == TrackStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_url_makes_success() {
        let task = GenerationTask::new("t1", Some("https://x/a.mp3".into()), false, None, "p");
        assert_eq!(task.status(), TrackStatus::Success);
        assert_eq!(task.audio_url(), Some("https://x/a.mp3"));
        assert!(task.is_playable());
    }

    #[test]
    fn test_blank_audio_url_is_not_success() {
        let task = GenerationTask::new("t1", Some("  ".into()), false, None, "p");
        assert_eq!(task.status(), TrackStatus::Pending);
        assert_eq!(task.audio_url(), None);
    }

    #[test]
    fn test_failure_never_has_audio() {
        let task = GenerationTask::new("t1", None, true, None, "p");
        assert_eq!(task.status(), TrackStatus::Failure);
        assert!(task.audio_url().is_none());
    }

    #[test]
    fn test_title_defaults() {
        let task = GenerationTask::new("t1", None, false, Some("".into()), "p");
        assert_eq!(task.title(), DEFAULT_TRACK_TITLE);
    }

    #[test]
    fn test_serializes_camel_case() {
        let task = GenerationTask::new("t1", Some("https://x/a.mp3".into()), false, Some("Dawn".into()), "p")
            .with_model_name(Some("chirp-v4".into()));
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["audioUrl"], "https://x/a.mp3");
        assert_eq!(json["status"], "SUCCESS");
        assert_eq!(json["modelName"], "chirp-v4");
        assert!(json.get("imageUrl").is_none());
    }
}
