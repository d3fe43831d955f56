//! Orchestrator tests with in-memory analyzer and music backends.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use vtrack_gemini::{AnalysisError, GeminiResult};
use vtrack_models::{AnalysisResult, ErrorKind, MediaRef, TaskId};
use vtrack_music::{
    GenerationRequest, MusicBackend, MusicError, MusicResult, PollConfig, StatusData, TaskKind,
};

use crate::error::PipelineError;
use crate::orchestrator::{
    Orchestrator, PipelineEvent, PipelineProgressFn, SceneAnalyzer, SoundtrackRequest,
};

// =============================================================================
// Fakes
// =============================================================================

struct FakeAnalyzer {
    result: Mutex<Option<GeminiResult<AnalysisResult>>>,
    calls: AtomicU32,
}

impl FakeAnalyzer {
    fn returning(result: GeminiResult<AnalysisResult>) -> Arc<Self> {
        Arc::new(Self {
            result: Mutex::new(Some(result)),
            calls: AtomicU32::new(0),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SceneAnalyzer for FakeAnalyzer {
    async fn analyze(
        &self,
        _script_text: &str,
        _media: Option<&MediaRef>,
    ) -> GeminiResult<AnalysisResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(AnalysisError::validation("called twice")))
    }
}

#[derive(Default)]
struct FakeMusic {
    music_statuses: Mutex<VecDeque<Value>>,
    wav_statuses: Mutex<VecDeque<Value>>,
    submitted: Mutex<Vec<GenerationRequest>>,
    wav_audio_ids: Mutex<Vec<String>>,
    status_calls: AtomicU32,
    reject_submit: bool,
}

impl FakeMusic {
    fn with_statuses(music: Vec<Value>) -> Self {
        Self {
            music_statuses: Mutex::new(music.into()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl MusicBackend for FakeMusic {
    async fn submit(&self, _credential: &str, request: &GenerationRequest) -> MusicResult<TaskId> {
        if self.reject_submit {
            return Err(MusicError::Provider {
                code: 429,
                message: "Insufficient credits".into(),
            });
        }
        self.submitted.lock().unwrap().push(request.clone());
        Ok(TaskId::from("music-1"))
    }

    async fn submit_wav_conversion(
        &self,
        _credential: &str,
        _task_id: &TaskId,
        audio_id: &str,
    ) -> MusicResult<TaskId> {
        self.wav_audio_ids.lock().unwrap().push(audio_id.to_string());
        Ok(TaskId::from("wav-1"))
    }

    async fn fetch_status(
        &self,
        kind: TaskKind,
        _task_id: &TaskId,
        _credential: &str,
    ) -> MusicResult<StatusData> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let queue = match kind {
            TaskKind::Music => &self.music_statuses,
            TaskKind::WavConversion => &self.wav_statuses,
        };
        let next = queue.lock().unwrap().pop_front();
        let value = next.unwrap_or_else(|| json!({ "status": "PENDING" }));
        Ok(serde_json::from_value(value).unwrap())
    }
}

fn analysis() -> AnalysisResult {
    AnalysisResult {
        summary: "A lighthouse keeper waits out a storm".into(),
        mood: "brooding".into(),
        title: "Keeper".into(),
        music_prompt: "low cello drones, distant thunder".into(),
    }
}

fn finished_tracks() -> Value {
    json!({
        "taskId": "music-1",
        "status": "SUCCESS",
        "response": { "sunoData": [
            { "id": "trk-1", "audioUrl": "https://cdn/1.mp3", "title": "Keeper" },
            { "id": "trk-2", "audioUrl": "https://cdn/2.mp3", "title": "Keeper (alt)" }
        ]}
    })
}

fn poll_config() -> PollConfig {
    PollConfig {
        interval: Duration::from_millis(1),
        max_attempts: 5,
        max_consecutive_errors: 5,
    }
}

fn orchestrator(analyzer: Arc<FakeAnalyzer>, music: Arc<FakeMusic>) -> Orchestrator {
    Orchestrator::new(analyzer, music, poll_config(), "music-key")
}

// =============================================================================
// Happy paths
// =============================================================================

#[tokio::test]
async fn test_full_run_uses_analysed_prompt() {
    let analyzer = FakeAnalyzer::returning(Ok(analysis()));
    let music = Arc::new(FakeMusic::with_statuses(vec![
        json!({ "status": "PENDING" }),
        finished_tracks(),
    ]));

    let outcome = orchestrator(analyzer.clone(), music.clone())
        .run(&SoundtrackRequest::new("INT. LIGHTHOUSE - NIGHT", None), None)
        .await
        .unwrap();

    assert_eq!(analyzer.calls(), 1);
    assert_eq!(outcome.task_id.as_str(), "music-1");
    assert_eq!(outcome.prompt, "low cello drones, distant thunder");
    assert_eq!(outcome.analysis.as_ref().unwrap().title, "Keeper");
    let ids: Vec<&str> = outcome.tracks.iter().map(|t| t.id()).collect();
    assert_eq!(ids, vec!["trk-1", "trk-2"]);
    assert!(outcome.wav.is_none());
    assert!(outcome.finished_at >= outcome.started_at);

    let submitted = music.submitted.lock().unwrap();
    assert_eq!(submitted.len(), 1);
    assert!(submitted[0].instrumental);
    assert!(!submitted[0].custom_mode());
}

#[tokio::test]
async fn test_prompt_only_skips_analysis() {
    let analyzer = FakeAnalyzer::returning(Ok(analysis()));
    let music = Arc::new(FakeMusic::with_statuses(vec![finished_tracks()]));

    let mut request = SoundtrackRequest::from_prompt("upbeat ukulele");
    request.title = Some("Sunny".into());
    request.style = Some("folk".into());
    request.instrumental = false;

    let outcome = orchestrator(analyzer.clone(), music.clone())
        .run(&request, None)
        .await
        .unwrap();

    assert_eq!(analyzer.calls(), 0);
    assert!(outcome.analysis.is_none());
    assert_eq!(outcome.prompt, "upbeat ukulele");

    let submitted = music.submitted.lock().unwrap();
    assert_eq!(submitted[0].title.as_deref(), Some("Sunny"));
    assert_eq!(submitted[0].style.as_deref(), Some("folk"));
    assert!(!submitted[0].instrumental);
    assert!(submitted[0].custom_mode());
}

#[tokio::test]
async fn test_wav_conversion_of_first_track() {
    let analyzer = FakeAnalyzer::returning(Ok(analysis()));
    let music = Arc::new(FakeMusic::with_statuses(vec![finished_tracks()]));
    *music.wav_statuses.lock().unwrap() = VecDeque::from(vec![
        json!({ "successFlag": "PENDING" }),
        json!({ "taskId": "wav-1", "successFlag": "SUCCESS", "response": { "audioWavUrl": "https://cdn/1.wav" } }),
    ]);

    let mut request = SoundtrackRequest::new("script", None);
    request.wav = true;

    let outcome = orchestrator(analyzer, music.clone())
        .run(&request, None)
        .await
        .unwrap();

    assert_eq!(music.wav_audio_ids.lock().unwrap().as_slice(), ["trk-1"]);
    let wav = outcome.wav.unwrap();
    assert_eq!(wav.audio_url(), Some("https://cdn/1.wav"));
}

#[tokio::test]
async fn test_progress_events_in_order() {
    let analyzer = FakeAnalyzer::returning(Ok(analysis()));
    let music = Arc::new(FakeMusic::with_statuses(vec![
        json!({ "status": "PENDING" }),
        finished_tracks(),
    ]));

    let events: Arc<Mutex<Vec<PipelineEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let callback = move |e: &PipelineEvent| sink.lock().unwrap().push(e.clone());

    orchestrator(analyzer, music)
        .run(
            &SoundtrackRequest::new("script", None),
            Some(&callback as &PipelineProgressFn<'_>),
        )
        .await
        .unwrap();

    let stages: Vec<&str> = events.lock().unwrap().iter().map(|e| e.stage()).collect();
    assert_eq!(
        stages,
        vec!["analysis", "analysis", "submission", "polling", "completed"]
    );
}

#[tokio::test]
async fn test_progress_callback_may_borrow_local_state() {
    let analyzer = FakeAnalyzer::returning(Ok(analysis()));
    let music = Arc::new(FakeMusic::with_statuses(vec![
        json!({ "status": "PENDING" }),
        finished_tracks(),
    ]));
    *music.wav_statuses.lock().unwrap() = VecDeque::from(vec![
        json!({ "successFlag": "PENDING" }),
        json!({ "taskId": "wav-1", "successFlag": "SUCCESS", "response": { "audioWavUrl": "https://cdn/1.wav" } }),
    ]);

    let mut request = SoundtrackRequest::new("script", None);
    request.wav = true;

    let stages: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());
    let callback = |e: &PipelineEvent| stages.lock().unwrap().push(e.stage());

    orchestrator(analyzer, music)
        .run(&request, Some(&callback as &PipelineProgressFn<'_>))
        .await
        .unwrap();

    let stages = stages.into_inner().unwrap();
    assert_eq!(stages.iter().filter(|s| **s == "polling").count(), 2);
    assert_eq!(stages.last(), Some(&"completed"));
}

#[tokio::test]
async fn test_panicking_progress_callback_is_ignored() {
    let analyzer = FakeAnalyzer::returning(Ok(analysis()));
    let music = Arc::new(FakeMusic::with_statuses(vec![finished_tracks()]));

    let callback = |_: &PipelineEvent| panic!("renderer crashed");
    let outcome = orchestrator(analyzer, music)
        .run(
            &SoundtrackRequest::new("script", None),
            Some(&callback as &PipelineProgressFn<'_>),
        )
        .await
        .unwrap();
    assert_eq!(outcome.tracks.len(), 2);
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_no_input_is_validation_without_calls() {
    let analyzer = FakeAnalyzer::returning(Ok(analysis()));
    let music = Arc::new(FakeMusic::default());

    let err = orchestrator(analyzer.clone(), music.clone())
        .run(&SoundtrackRequest::new("  ", None), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(analyzer.calls(), 0);
    assert!(music.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_credential_is_config_error() {
    let analyzer = FakeAnalyzer::returning(Ok(analysis()));
    let music = Arc::new(FakeMusic::default());

    let err = Orchestrator::new(analyzer.clone(), music, poll_config(), "")
        .run(&SoundtrackRequest::new("script", None), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Config);
    assert_eq!(analyzer.calls(), 0);
}

#[tokio::test]
async fn test_analyze_alone_needs_no_music_credential() {
    let analyzer = FakeAnalyzer::returning(Ok(analysis()));
    let music = Arc::new(FakeMusic::default());

    let result = Orchestrator::new(analyzer.clone(), music.clone(), poll_config(), "")
        .analyze(&SoundtrackRequest::new("script", None))
        .await
        .unwrap();

    assert_eq!(result, analysis());
    assert_eq!(analyzer.calls(), 1);
    assert_eq!(music.status_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_analysis_error_propagates_kind() {
    let analyzer = FakeAnalyzer::returning(Err(AnalysisError::Timeout(Duration::from_secs(120))));
    let music = Arc::new(FakeMusic::default());

    let err = orchestrator(analyzer, music.clone())
        .run(&SoundtrackRequest::new("script", None), None)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Analysis(_)));
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(music.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_analysis_is_parse_error() {
    let analyzer = FakeAnalyzer::returning(Ok(AnalysisResult::default()));
    let music = Arc::new(FakeMusic::default());

    let err = orchestrator(analyzer, music.clone())
        .run(&SoundtrackRequest::new("script", None), None)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::EmptyPrompt));
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert!(music.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_submission_rejection_is_provider_error() {
    let analyzer = FakeAnalyzer::returning(Ok(analysis()));
    let music = Arc::new(FakeMusic {
        reject_submit: true,
        ..Default::default()
    });

    let err = orchestrator(analyzer, music.clone())
        .run(&SoundtrackRequest::new("script", None), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Provider);
    assert!(err.to_string().contains("Insufficient credits"));
    assert_eq!(music.status_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_provider_failure_during_polling() {
    let analyzer = FakeAnalyzer::returning(Ok(analysis()));
    let music = Arc::new(FakeMusic::with_statuses(vec![
        json!({ "status": "PENDING" }),
        json!({ "status": "CREATE_TASK_FAILED", "errorMessage": "quota exceeded" }),
    ]));

    let err = orchestrator(analyzer, music)
        .run(&SoundtrackRequest::new("script", None), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Provider);
    assert!(err.to_string().contains("quota exceeded"));
}

#[tokio::test]
async fn test_never_finishing_task_times_out() {
    let analyzer = FakeAnalyzer::returning(Ok(analysis()));
    let music = Arc::new(FakeMusic::default());

    let err = orchestrator(analyzer, music.clone())
        .run(&SoundtrackRequest::new("script", None), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(err.to_string().contains("PENDING"));
    assert_eq!(music.status_calls.load(Ordering::SeqCst), 5);
}
