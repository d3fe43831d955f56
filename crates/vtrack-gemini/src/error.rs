//! Analysis client error types.

use std::time::Duration;

use thiserror::Error;
use vtrack_models::ErrorKind;

pub type GeminiResult<T> = Result<T, AnalysisError>;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{context} returned {status}: {body}")]
    Upstream {
        context: String,
        status: u16,
        body: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Analysis task failed: {0}")]
    TaskFailed(String),

    #[error("Analysis timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("Failed to parse analysis: {message}")]
    Parse { message: String, raw: String },
}

impl AnalysisError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn upstream(context: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Upstream {
            context: context.into(),
            status,
            body: body.into(),
        }
    }

    pub fn parse(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            raw: raw.into(),
        }
    }

    /// Taxonomy bucket for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::Validation(_) => ErrorKind::Validation,
            AnalysisError::Config(_) => ErrorKind::Config,
            AnalysisError::Upstream { .. }
            | AnalysisError::Network(_)
            | AnalysisError::TaskFailed(_) => ErrorKind::Upstream,
            AnalysisError::Timeout(_) => ErrorKind::Timeout,
            AnalysisError::Parse { .. } => ErrorKind::Parse,
        }
    }

    /// Upstream HTTP status, if the failure carried one.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            AnalysisError::Upstream { status, .. } => Some(*status),
            AnalysisError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Raw model output attached to a parse failure.
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            AnalysisError::Parse { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            AnalysisError::Network(_) | AnalysisError::Timeout(_) => true,
            AnalysisError::Upstream { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
