//! Soundtrack orchestration.
//!
//! Sequences one generation attempt: analysis, submission, polling and the
//! optional WAV conversion. Each [`Orchestrator::run`] owns its own task id
//! and poll state, so several runs may proceed concurrently.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};
use vtrack_gemini::{AnalysisClient, GeminiResult};
use vtrack_models::{AnalysisResult, GenerationTask, MediaRef, TaskId};
use vtrack_music::{
    GenerationRequest, MusicBackend, MusicError, PollConfig, PollProgress, ProgressFn, TaskKind,
    TaskPoller,
};

use crate::error::{PipelineError, PipelineResult};

/// Turns a script and/or media into a structured analysis.
#[async_trait]
pub trait SceneAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        script_text: &str,
        media: Option<&MediaRef>,
    ) -> GeminiResult<AnalysisResult>;
}

#[async_trait]
impl SceneAnalyzer for AnalysisClient {
    async fn analyze(
        &self,
        script_text: &str,
        media: Option<&MediaRef>,
    ) -> GeminiResult<AnalysisResult> {
        AnalysisClient::analyze(self, script_text, media).await
    }
}

/// One soundtrack request.
#[derive(Debug, Clone, Default)]
pub struct SoundtrackRequest {
    pub script_text: String,
    pub media: Option<MediaRef>,
    /// Use this prompt instead of the analysed one; skips analysis
    pub prompt: Option<String>,
    pub title: Option<String>,
    pub style: Option<String>,
    pub instrumental: bool,
    /// Also convert the first track to WAV
    pub wav: bool,
}

impl SoundtrackRequest {
    pub fn new(script_text: impl Into<String>, media: Option<MediaRef>) -> Self {
        Self {
            script_text: script_text.into(),
            media,
            instrumental: true,
            ..Default::default()
        }
    }

    /// Request that goes straight to music generation.
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            instrumental: true,
            ..Default::default()
        }
    }

    fn prompt_override(&self) -> Option<&str> {
        self.prompt.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }

    /// Analysis runs unless a prompt was supplied directly.
    pub fn needs_analysis(&self) -> bool {
        self.prompt_override().is_none()
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundtrackOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisResult>,
    pub task_id: TaskId,
    pub prompt: String,
    pub tracks: Vec<GenerationTask>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wav: Option<GenerationTask>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Progress of one run.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Analyzing,
    Analyzed { title: String, mood: String },
    Submitted { task_id: String },
    Polling(PollProgress),
    ConvertingWav { task_id: String },
    Completed { tracks: usize },
}

impl PipelineEvent {
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineEvent::Analyzing | PipelineEvent::Analyzed { .. } => "analysis",
            PipelineEvent::Submitted { .. } => "submission",
            PipelineEvent::Polling(_) => "polling",
            PipelineEvent::ConvertingWav { .. } => "wav_conversion",
            PipelineEvent::Completed { .. } => "completed",
        }
    }

    /// Display line for this event.
    pub fn message(&self) -> String {
        match self {
            PipelineEvent::Analyzing => "Analyzing video and script...".to_string(),
            PipelineEvent::Analyzed { title, mood } => {
                format!("Analysis complete: \"{}\" ({})", title, mood)
            }
            PipelineEvent::Submitted { task_id } => format!("Music task {} submitted", task_id),
            PipelineEvent::Polling(progress) => progress.message(),
            PipelineEvent::ConvertingWav { task_id } => {
                format!("Converting to WAV (task {})", task_id)
            }
            PipelineEvent::Completed { tracks } => format!("Done: {} track(s)", tracks),
        }
    }
}

/// Progress callback for a run. Best-effort: panics are caught and logged.
/// The lifetime lets callers pass closures that borrow local state.
pub type PipelineProgressFn<'a> = dyn Fn(&PipelineEvent) + Send + Sync + 'a;

/// Drives analysis, generation and polling for one request at a time.
#[derive(Clone)]
pub struct Orchestrator {
    analyzer: Arc<dyn SceneAnalyzer>,
    music: Arc<dyn MusicBackend>,
    poller: TaskPoller,
    credential: String,
}

impl Orchestrator {
    /// Create an orchestrator from already configured clients.
    ///
    /// `credential` is the music service key passed to every music call.
    pub fn new(
        analyzer: Arc<dyn SceneAnalyzer>,
        music: Arc<dyn MusicBackend>,
        poll: PollConfig,
        credential: impl Into<String>,
    ) -> Self {
        let poller = TaskPoller::new(music.clone(), poll);
        Self {
            analyzer,
            music,
            poller,
            credential: credential.into(),
        }
    }

    /// Run the analysis step alone.
    pub async fn analyze(&self, request: &SoundtrackRequest) -> PipelineResult<AnalysisResult> {
        if request.script_text.trim().is_empty() && request.media.is_none() {
            return Err(PipelineError::validation(
                "Provide a script, a video, or both",
            ));
        }
        Ok(self
            .analyzer
            .analyze(&request.script_text, request.media.as_ref())
            .await?)
    }

    /// Run a full generation attempt.
    ///
    /// Resolves with the playable tracks in provider order.
    pub async fn run(
        &self,
        request: &SoundtrackRequest,
        on_progress: Option<&PipelineProgressFn<'_>>,
    ) -> PipelineResult<SoundtrackOutcome> {
        if request.needs_analysis()
            && request.script_text.trim().is_empty()
            && request.media.is_none()
        {
            return Err(PipelineError::validation(
                "Provide a script, a video, a prompt, or a combination",
            ));
        }
        if self.credential.trim().is_empty() {
            return Err(PipelineError::config("Music API credential is missing"));
        }

        let started_at = Utc::now();
        let span = info_span!(
            "soundtrack",
            analysis = request.needs_analysis(),
            wav = request.wav
        );

        async {
            let analysis = match request.prompt_override() {
                Some(_) => None,
                None => {
                    emit(on_progress, &PipelineEvent::Analyzing);
                    let analysis = self.analyze(request).await?;
                    emit(
                        on_progress,
                        &PipelineEvent::Analyzed {
                            title: analysis.title.clone(),
                            mood: analysis.mood.clone(),
                        },
                    );
                    Some(analysis)
                }
            };

            let prompt = resolve_prompt(request, analysis.as_ref())?;
            let mut generation = GenerationRequest::new(prompt.clone())
                .instrumental(request.instrumental);
            if let Some(title) = &request.title {
                generation = generation.title(title.clone());
            }
            if let Some(style) = &request.style {
                generation = generation.style(style.clone());
            }

            let task_id = self.music.submit(&self.credential, &generation).await?;
            emit(
                on_progress,
                &PipelineEvent::Submitted {
                    task_id: task_id.to_string(),
                },
            );

            let forward = |progress: &PollProgress| {
                emit(on_progress, &PipelineEvent::Polling(progress.clone()));
            };
            let tracks = self
                .poller
                .poll(&task_id, &self.credential, Some(&forward as &ProgressFn<'_>))
                .await?;

            let wav = if request.wav {
                Some(self.convert_first(&task_id, &tracks, on_progress).await?)
            } else {
                None
            };

            emit(
                on_progress,
                &PipelineEvent::Completed {
                    tracks: tracks.len(),
                },
            );
            info!(task_id = %task_id, tracks = tracks.len(), "Soundtrack ready");

            Ok::<_, PipelineError>(SoundtrackOutcome {
                analysis,
                task_id,
                prompt,
                tracks,
                wav,
                started_at,
                finished_at: Utc::now(),
            })
        }
        .instrument(span)
        .await
    }

    /// Convert the first track of a finished task to WAV.
    async fn convert_first(
        &self,
        task_id: &TaskId,
        tracks: &[GenerationTask],
        on_progress: Option<&PipelineProgressFn<'_>>,
    ) -> PipelineResult<GenerationTask> {
        let first = tracks
            .first()
            .ok_or_else(|| PipelineError::validation("No track available for WAV conversion"))?;

        let wav_task = self
            .music
            .submit_wav_conversion(&self.credential, task_id, first.id())
            .await?;
        emit(
            on_progress,
            &PipelineEvent::ConvertingWav {
                task_id: wav_task.to_string(),
            },
        );

        let forward = |progress: &PollProgress| {
            emit(on_progress, &PipelineEvent::Polling(progress.clone()));
        };
        let converted = self
            .poller
            .poll_kind(
                TaskKind::WavConversion,
                &wav_task,
                &self.credential,
                Some(&forward as &ProgressFn<'_>),
            )
            .await?;

        first_converted(&wav_task, converted)
    }
}

/// A finished WAV task without a file is a provider fault.
fn first_converted(
    wav_task: &TaskId,
    converted: Vec<GenerationTask>,
) -> PipelineResult<GenerationTask> {
    converted.into_iter().next().ok_or_else(|| {
        MusicError::MissingOutput {
            task_id: wav_task.to_string(),
            status: "SUCCESS".to_string(),
        }
        .into()
    })
}

/// Prompt override first, then the analysed prompt, then the summary.
fn resolve_prompt(
    request: &SoundtrackRequest,
    analysis: Option<&AnalysisResult>,
) -> PipelineResult<String> {
    if let Some(prompt) = request.prompt_override() {
        return Ok(prompt.to_string());
    }
    analysis
        .and_then(|a| {
            [&a.music_prompt, &a.summary]
                .into_iter()
                .map(|s| s.trim())
                .find(|s| !s.is_empty())
        })
        .map(str::to_string)
        .ok_or(PipelineError::EmptyPrompt)
}

fn emit(on_progress: Option<&PipelineProgressFn<'_>>, event: &PipelineEvent) {
    let Some(callback) = on_progress else {
        return;
    };
    if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
        warn!(stage = event.stage(), "Progress callback panicked; ignoring");
    }
}
