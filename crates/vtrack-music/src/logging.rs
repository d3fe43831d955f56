//! Structured poll logging.
//!
//! Every line of one poll loop carries the same `task_id` and `kind`
//! fields, plus `attempt`/`status` where they apply, so a run can be
//! filtered out of JSON logs by task.

use std::time::Duration;

use tracing::{error, info, warn, Span};
use vtrack_models::TaskId;

use crate::config::PollConfig;
use crate::error::MusicError;
use crate::poller::PollPhase;
use crate::types::TaskKind;

/// Logger bound to one polled task.
#[derive(Debug, Clone)]
pub struct TaskLogger {
    task_id: String,
    kind: TaskKind,
}

impl TaskLogger {
    pub fn new(task_id: &TaskId, kind: TaskKind) -> Self {
        Self {
            task_id: task_id.to_string(),
            kind,
        }
    }

    /// Span wrapping the whole poll loop.
    pub fn span(&self) -> Span {
        tracing::info_span!(
            "poll",
            task_id = %self.task_id,
            kind = self.kind.as_str()
        )
    }

    pub fn started(&self, config: &PollConfig) {
        info!(
            task_id = %self.task_id,
            kind = self.kind.as_str(),
            interval_ms = config.interval.as_millis() as u64,
            max_attempts = config.max_attempts,
            ceiling_secs = config.ceiling().as_secs(),
            "Polling started"
        );
    }

    /// A well-formed, non-terminal reply.
    pub fn pending(&self, attempt: u32, status: &str, percent: u8) {
        info!(
            task_id = %self.task_id,
            kind = self.kind.as_str(),
            attempt,
            status,
            percent,
            "Task still running"
        );
    }

    /// A status query that failed and counts towards escalation.
    pub fn query_failed(&self, attempt: u32, consecutive_errors: u32, err: &MusicError) {
        warn!(
            task_id = %self.task_id,
            kind = self.kind.as_str(),
            attempt,
            consecutive_errors,
            error = %err,
            "Status query failed"
        );
    }

    pub fn succeeded(&self, attempt: u32, tracks: usize, elapsed: Duration) {
        info!(
            task_id = %self.task_id,
            kind = self.kind.as_str(),
            attempt,
            tracks,
            elapsed_secs = elapsed.as_secs(),
            "Task finished"
        );
    }

    /// Any terminal phase other than success.
    pub fn gave_up(&self, phase: PollPhase, attempt: u32, err: &MusicError) {
        error!(
            task_id = %self.task_id,
            kind = self.kind.as_str(),
            phase = phase.as_str(),
            attempt,
            error_kind = %err.kind(),
            "Task did not finish: {}", err
        );
    }
}
