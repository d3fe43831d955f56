//! Music client error types.

use thiserror::Error;
use vtrack_models::ErrorKind;

pub type MusicResult<T> = Result<T, MusicError>;

#[derive(Debug, Error)]
pub enum MusicError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Music API returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Music API error {code}: {message}")]
    Provider { code: i64, message: String },

    #[error("Generation failed ({status}): {message}")]
    TaskFailed { status: String, message: String },

    #[error("Task {task_id} reported {status}: complete but missing output")]
    MissingOutput { task_id: String, status: String },

    #[error("Invalid response: {message}")]
    Parse { message: String, raw: String },

    #[error("Gave up after {errors} consecutive status errors; last error: {last_error}")]
    Escalated { errors: u32, last_error: String },

    #[error(
        "Task {task_id} still {last_status} after {attempts} status checks ({elapsed_secs}s)"
    )]
    Timeout {
        task_id: String,
        attempts: u32,
        elapsed_secs: u64,
        last_status: String,
    },
}

impl MusicError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
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
            MusicError::Validation(_) => ErrorKind::Validation,
            MusicError::Config(_) => ErrorKind::Config,
            MusicError::Upstream { .. } | MusicError::Network(_) | MusicError::Escalated { .. } => {
                ErrorKind::Upstream
            }
            MusicError::Provider { .. }
            | MusicError::TaskFailed { .. }
            | MusicError::MissingOutput { .. } => ErrorKind::Provider,
            MusicError::Parse { .. } => ErrorKind::Parse,
            MusicError::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    /// Check if a single status query failing this way may be retried.
    ///
    /// Everything that is not a precondition failure or a definitive task
    /// outcome is treated as transient by the poller.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MusicError::Upstream { .. }
                | MusicError::Network(_)
                | MusicError::Provider { .. }
                | MusicError::Parse { .. }
        )
    }

    /// Last status observed before a timeout.
    pub fn last_status(&self) -> Option<&str> {
        match self {
            MusicError::Timeout { last_status, .. } => Some(last_status),
            _ => None,
        }
    }
}
