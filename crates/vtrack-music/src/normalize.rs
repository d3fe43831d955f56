//! Maps provider status payloads onto [`GenerationTask`] records.
//!
//! Pure and deterministic: the same payload always yields structurally equal
//! tasks, in provider order.

use vtrack_models::{GenerationTask, StatusClass};

use crate::types::{ProviderResponse, StatusData, TrackEntry};

/// Convert a status payload into task records.
///
/// A track with a non-empty audio URL is `Success`. Without one it is
/// `Failure` when the overall status is a failure, otherwise `Pending`.
pub fn normalize(data: &StatusData) -> Vec<GenerationTask> {
    let status = data.effective_status();
    let failed = StatusClass::classify(&status) == StatusClass::Failure;
    let task_id = data.task_id.as_deref().unwrap_or_default();

    match &data.response {
        Some(ProviderResponse::Tracks { tracks }) => tracks
            .iter()
            .enumerate()
            .map(|(index, entry)| track_to_task(task_id, index, entry, failed))
            .collect(),
        Some(ProviderResponse::Wav { audio_wav_url }) => vec![GenerationTask::new(
            task_id,
            Some(audio_wav_url.clone()),
            failed,
            None,
            "",
        )],
        Some(ProviderResponse::Unknown(_)) | None => Vec::new(),
    }
}

fn track_to_task(task_id: &str, index: usize, entry: &TrackEntry, failed: bool) -> GenerationTask {
    let id = first_present([&entry.id, &entry.track_id, &entry.audio_id])
        .unwrap_or_else(|| format!("{}-{}", task_id, index));

    let audio_url = first_present([&entry.audio_url, &entry.source_audio_url]);

    GenerationTask::new(
        id,
        audio_url,
        failed,
        entry.title.clone(),
        entry.prompt.clone().unwrap_or_default(),
    )
    .with_image_url(entry.image_url.clone())
    .with_model_name(entry.model_name.clone())
    .with_tags(entry.tags.clone())
    .with_duration(entry.duration)
}

fn first_present<const N: usize>(candidates: [&Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .map(str::to_string)
}
