//! Analysis HTTP client.

use std::sync::Arc;
use std::time::Instant;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, info, info_span, warn, Instrument};
use vtrack_models::{AnalysisRequest, AnalysisResult, MediaRef};

use crate::config::{GeminiConfig, MediaMode};
use crate::error::{AnalysisError, GeminiResult};
use crate::extract::parse_analysis;
use crate::metrics::{record_analysis, record_inline_media};
use crate::payload::{encode_inline, MediaPart, PayloadBuilder, RequestParts};
use crate::types::{Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig};

/// MIME type assumed when a fetched URL does not declare one.
const FALLBACK_MIME_TYPE: &str = "video/mp4";

/// Client for script/video analysis.
///
/// Cheap to clone; clones share the HTTP connection pool.
#[derive(Clone)]
pub struct AnalysisClient {
    http: Client,
    config: Arc<GeminiConfig>,
    builder: Arc<PayloadBuilder>,
}

impl AnalysisClient {
    /// Create a new analysis client.
    ///
    /// No per-request HTTP timeout is set; the whole operation is bounded by
    /// `config.timeout` instead.
    pub fn new(config: GeminiConfig) -> GeminiResult<Self> {
        let http = Client::builder().build().map_err(AnalysisError::Network)?;

        Ok(Self {
            http,
            config: Arc::new(config),
            builder: Arc::new(PayloadBuilder::new()),
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> GeminiResult<Self> {
        Self::new(GeminiConfig::from_env()?)
    }

    /// Replace the payload builder.
    pub fn with_builder(mut self, builder: PayloadBuilder) -> Self {
        self.builder = Arc::new(builder);
        self
    }

    /// Same client with a different media mode.
    pub fn with_media_mode(mut self, media_mode: MediaMode) -> Self {
        if self.config.media_mode != media_mode {
            let mut config = (*self.config).clone();
            config.media_mode = media_mode;
            self.config = Arc::new(config);
        }
        self
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Analyze a prepared request.
    pub async fn analyze_request(&self, request: &AnalysisRequest) -> GeminiResult<AnalysisResult> {
        self.analyze(&request.script_text, request.media.as_ref()).await
    }

    /// Analyze a script and/or media.
    ///
    /// Input and configuration are checked before any network call. The
    /// request then runs as its own task raced against the timeout; if the
    /// timer wins, the task is left to finish on its own and its result is
    /// discarded.
    pub async fn analyze(
        &self,
        script_text: &str,
        media: Option<&MediaRef>,
    ) -> GeminiResult<AnalysisResult> {
        if script_text.trim().is_empty() && media.is_none() {
            return Err(AnalysisError::validation(
                "Provide a script, a video, or both",
            ));
        }
        if let Some(media) = media {
            media
                .validate()
                .map_err(|e| AnalysisError::validation(e.to_string()))?;
        }
        let api_key = self.config.validate()?.to_string();

        let parts = self.builder.build(script_text, media);
        let span = info_span!(
            "analysis",
            model = %self.config.model,
            media_mode = self.config.media_mode.as_str(),
            has_media = media.is_some()
        );

        let started = Instant::now();
        let this = self.clone();
        let handle = tokio::spawn(async move { this.execute(parts, &api_key).await }.instrument(span));

        let outcome = tokio::select! {
            joined = handle => match joined {
                Ok(result) => result,
                Err(e) => Err(AnalysisError::TaskFailed(e.to_string())),
            },
            _ = tokio::time::sleep(self.config.timeout) => {
                warn!(
                    timeout_ms = self.config.timeout.as_millis() as u64,
                    "Analysis exceeded its time budget, abandoning request"
                );
                Err(AnalysisError::Timeout(self.config.timeout))
            }
        };

        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        match &outcome {
            Ok(result) => {
                info!(latency_ms, title = %result.title, mood = %result.mood, "Analysis complete");
                record_analysis("success", latency_ms);
            }
            Err(e) => {
                warn!(latency_ms, kind = %e.kind(), "Analysis failed: {}", e);
                record_analysis(e.kind().as_str(), latency_ms);
            }
        }

        outcome
    }

    /// Resolve media, send the request and parse the reply.
    async fn execute(self, parts: RequestParts, api_key: &str) -> GeminiResult<AnalysisResult> {
        let parts = self.resolve_media(parts).await?;

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: parts.to_parts(),
            }],
            generation_config: GenerationConfig::analysis(),
        };

        let url = self.config.endpoint();
        debug!("Sending analysis request to {}", url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::upstream("Gemini API", status.as_u16(), body));
        }

        let raw = response.text().await?;
        let envelope: GenerateContentResponse = serde_json::from_str(&raw).map_err(|e| {
            AnalysisError::parse(format!("Unexpected Gemini response envelope: {}", e), raw.as_str())
        })?;

        let text = envelope
            .first_text()
            .ok_or_else(|| AnalysisError::parse("No content in Gemini response", raw.as_str()))?;

        parse_analysis(text)
    }

    /// In inline mode, fetch a referenced URL and embed it. In proxy mode the
    /// reference is forwarded untouched.
    async fn resolve_media(&self, parts: RequestParts) -> GeminiResult<RequestParts> {
        if self.config.media_mode != MediaMode::Inline {
            return Ok(parts);
        }
        let Some(url) = parts.media_reference().map(str::to_string) else {
            return Ok(parts);
        };

        debug!("Fetching media for inline analysis from {}", url);
        let response = self.http.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::upstream("Media fetch", status.as_u16(), body));
        }

        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string());

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(AnalysisError::validation(format!("Media at {} is empty", url)));
        }

        record_inline_media(bytes.len());
        info!(bytes = bytes.len(), mime_type = %mime_type, "Media fetched for inline analysis");

        Ok(parts.with_media(Some(MediaPart::Inline(encode_inline(&bytes, &mime_type)))))
    }
}
