//! Pipeline error types.

use thiserror::Error;
use vtrack_gemini::AnalysisError;
use vtrack_models::ErrorKind;
use vtrack_music::MusicError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Analysis produced no music prompt")]
    EmptyPrompt,

    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Music generation failed: {0}")]
    Music(#[from] MusicError),
}

impl PipelineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Taxonomy bucket for this error, looking through wrapped errors.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Validation(_) => ErrorKind::Validation,
            PipelineError::Config(_) => ErrorKind::Config,
            PipelineError::EmptyPrompt => ErrorKind::Parse,
            PipelineError::Analysis(e) => e.kind(),
            PipelineError::Music(e) => e.kind(),
        }
    }

    /// Check if running the pipeline again may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::Analysis(e) => e.is_retryable(),
            PipelineError::Music(e) => matches!(
                e.kind(),
                ErrorKind::Upstream | ErrorKind::Timeout
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_passes_through() {
        let err: PipelineError = AnalysisError::parse("bad json", "Sure!").into();
        assert_eq!(err.kind(), ErrorKind::Parse);

        let err: PipelineError = MusicError::Timeout {
            task_id: "t".into(),
            attempts: 60,
            elapsed_secs: 300,
            last_status: "PENDING".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(err.to_string().contains("PENDING"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_preconditions_not_retryable() {
        assert!(!PipelineError::validation("x").is_retryable());
        assert!(!PipelineError::config("x").is_retryable());
        assert!(PipelineError::validation("x").kind().is_precondition());
    }

    #[test]
    fn test_provider_failure_not_retryable() {
        let err: PipelineError = MusicError::TaskFailed {
            status: "CREATE_TASK_FAILED".into(),
            message: "quota exceeded".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Provider);
        assert!(!err.is_retryable());
    }
}
