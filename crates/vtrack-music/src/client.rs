//! Music service HTTP client.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};
use vtrack_models::TaskId;

use crate::config::MusicConfig;
use crate::error::{MusicError, MusicResult};
use crate::metrics::record_submission;
use crate::types::{
    Envelope, GenerateBody, GenerationRequest, StatusData, SubmitData, TaskKind, WavBody,
};

const GENERATE_PATH: &str = "/api/v1/generate";
const WAV_GENERATE_PATH: &str = "/api/v1/wav/generate";

/// Operations the orchestrator and poller need from the music service.
///
/// Implemented by [`MusicClient`]; tests substitute scripted fakes.
#[async_trait]
pub trait MusicBackend: Send + Sync {
    /// Submit a generation job.
    async fn submit(&self, credential: &str, request: &GenerationRequest) -> MusicResult<TaskId>;

    /// Submit a WAV conversion of one generated track.
    async fn submit_wav_conversion(
        &self,
        credential: &str,
        task_id: &TaskId,
        audio_id: &str,
    ) -> MusicResult<TaskId>;

    /// Query a task's status once.
    async fn fetch_status(
        &self,
        kind: TaskKind,
        task_id: &TaskId,
        credential: &str,
    ) -> MusicResult<StatusData>;
}

/// Client for the music generation API.
#[derive(Clone)]
pub struct MusicClient {
    http: Client,
    config: MusicConfig,
}

impl MusicClient {
    /// Create a new music client.
    pub fn new(config: MusicConfig) -> MusicResult<Self> {
        let http = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(MusicError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> MusicResult<Self> {
        Self::new(MusicConfig::from_env())
    }

    pub fn config(&self) -> &MusicConfig {
        &self.config
    }

    /// POST a JSON body and return the unwrapped `data` of the envelope.
    async fn post_envelope<B, T>(&self, path: &str, credential: &str, body: &B) -> MusicResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.config.url(path);
        debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(credential)
            .json(body)
            .send()
            .await?;

        read_envelope(response).await
    }
}

/// Check HTTP status, decode `{code, msg, data}` and unwrap `data`.
async fn read_envelope<T: DeserializeOwned>(response: reqwest::Response) -> MusicResult<T> {
    let status = response.status();
    let raw = response.text().await?;

    if !status.is_success() {
        return Err(MusicError::Upstream {
            status: status.as_u16(),
            body: raw,
        });
    }

    let envelope: Envelope<T> = serde_json::from_str(&raw)
        .map_err(|e| MusicError::parse(format!("Unexpected music API response: {}", e), raw.as_str()))?;

    if envelope.code != 200 {
        return Err(MusicError::Provider {
            code: envelope.code,
            message: envelope
                .msg
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "no message".to_string()),
        });
    }

    envelope
        .data
        .ok_or_else(|| MusicError::parse("Music API response has no data", raw.as_str()))
}

fn require_credential(credential: &str) -> MusicResult<()> {
    if credential.trim().is_empty() {
        return Err(MusicError::config("Music API credential is missing"));
    }
    Ok(())
}

fn task_id_from(data: SubmitData) -> MusicResult<TaskId> {
    data.task_id
        .filter(|id| !id.trim().is_empty())
        .map(TaskId::from)
        .ok_or_else(|| MusicError::parse("Music API response has no taskId", ""))
}

#[async_trait]
impl MusicBackend for MusicClient {
    async fn submit(&self, credential: &str, request: &GenerationRequest) -> MusicResult<TaskId> {
        require_credential(credential)?;
        if request.prompt.trim().is_empty() {
            return Err(MusicError::validation("Music prompt is empty"));
        }

        let body = GenerateBody {
            prompt: &request.prompt,
            custom_mode: request.custom_mode(),
            instrumental: request.instrumental,
            model: &self.config.model,
            call_back_url: &self.config.callback_url,
            title: request.title.as_deref(),
            style: request.style.as_deref(),
        };

        let result = self
            .post_envelope::<_, SubmitData>(GENERATE_PATH, credential, &body)
            .await
            .and_then(task_id_from);

        match &result {
            Ok(task_id) => {
                info!(task_id = %task_id, model = %self.config.model, "Music generation submitted");
                record_submission(TaskKind::Music.as_str(), "ok");
            }
            Err(e) => {
                warn!("Music generation submission failed: {}", e);
                record_submission(TaskKind::Music.as_str(), e.kind().as_str());
            }
        }
        result
    }

    async fn submit_wav_conversion(
        &self,
        credential: &str,
        task_id: &TaskId,
        audio_id: &str,
    ) -> MusicResult<TaskId> {
        require_credential(credential)?;
        if audio_id.trim().is_empty() {
            return Err(MusicError::validation("Audio ID is empty"));
        }

        let body = WavBody {
            task_id: task_id.as_str(),
            audio_id,
            call_back_url: &self.config.callback_url,
        };

        let result = self
            .post_envelope::<_, SubmitData>(WAV_GENERATE_PATH, credential, &body)
            .await
            .and_then(task_id_from);

        match &result {
            Ok(wav_task) => {
                info!(task_id = %task_id, wav_task_id = %wav_task, audio_id, "WAV conversion submitted");
                record_submission(TaskKind::WavConversion.as_str(), "ok");
            }
            Err(e) => {
                warn!(task_id = %task_id, "WAV conversion submission failed: {}", e);
                record_submission(TaskKind::WavConversion.as_str(), e.kind().as_str());
            }
        }
        result
    }

    async fn fetch_status(
        &self,
        kind: TaskKind,
        task_id: &TaskId,
        credential: &str,
    ) -> MusicResult<StatusData> {
        require_credential(credential)?;

        let url = self.config.url(kind.status_path());
        let response = self
            .http
            .get(&url)
            .bearer_auth(credential)
            .query(&[("taskId", task_id.as_str())])
            .send()
            .await?;

        read_envelope(response).await
    }
}
