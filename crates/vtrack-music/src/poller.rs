//! Task polling state machine.
//!
//! One poller drives one task from submission to a terminal phase. Each
//! iteration sleeps the configured interval, then queries the status once;
//! polls for the same task never overlap.
//!
//! # Transitions
//!
//! | From        | Observation                                    | To          |
//! |-------------|------------------------------------------------|-------------|
//! | `Submitted` | first status query                             | `Polling`   |
//! | `Polling`   | query failed, errors below threshold           | `Polling`   |
//! | `Polling`   | query failed, errors reach threshold           | `Escalated` |
//! | `Polling`   | non-terminal status                            | `Polling`   |
//! | `Polling`   | success-class status, at least one audio URL   | `Succeeded` |
//! | `Polling`   | `*_SUCCESS` stage without audio yet            | `Polling`   |
//! | `Polling`   | exact `SUCCESS` without audio                  | `Failed`    |
//! | `Polling`   | failure-class status                           | `Failed`    |
//! | `Polling`   | attempt budget spent                           | `TimedOut`  |
//!
//! A failed query is a transport error, a non-2xx reply, an envelope with a
//! non-200 `code`, or a body that cannot be decoded. Any well-formed reply
//! resets the consecutive error count.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{warn, Instrument};
use vtrack_models::{GenerationTask, StatusClass, TaskId};

use crate::client::MusicBackend;
use crate::config::PollConfig;
use crate::error::{MusicError, MusicResult};
use crate::logging::TaskLogger;
use crate::metrics::{record_poll, record_task_finished};
use crate::normalize::normalize;
use crate::types::{StatusData, TaskKind};

/// Status reported before any reply has been seen.
const UNKNOWN_STATUS: &str = "UNKNOWN";

/// Named states of the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollPhase {
    Submitted,
    Polling,
    Succeeded,
    Failed,
    TimedOut,
    Escalated,
}

impl PollPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PollPhase::Submitted => "submitted",
            PollPhase::Polling => "polling",
            PollPhase::Succeeded => "succeeded",
            PollPhase::Failed => "failed",
            PollPhase::TimedOut => "timed_out",
            PollPhase::Escalated => "escalated",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollPhase::Submitted | PollPhase::Polling)
    }
}

/// Progress notification emitted while a task is still running.
#[derive(Debug, Clone, PartialEq)]
pub struct PollProgress {
    pub task_id: String,
    pub status: String,
    pub attempt: u32,
    pub max_attempts: u32,
    pub elapsed: Duration,
    /// Coarse estimate, never 100 before completion
    pub percent: u8,
    /// Set when the last query failed and will be retried
    pub retrying: bool,
}

impl PollProgress {
    /// One-line description for display.
    pub fn message(&self) -> String {
        if self.retrying {
            format!(
                "Status check failed, retrying ({}s elapsed, attempt {}/{})",
                self.elapsed.as_secs(),
                self.attempt,
                self.max_attempts
            )
        } else {
            format!(
                "{} ({}%, {}s elapsed)",
                self.status,
                self.percent,
                self.elapsed.as_secs()
            )
        }
    }
}

/// Progress callback. Best-effort: a panic inside it is caught and logged.
///
/// The lifetime lets callers pass closures that borrow local state.
pub type ProgressFn<'a> = dyn Fn(&PollProgress) + Send + Sync + 'a;

/// Mutable bookkeeping for one poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollState {
    pub phase: PollPhase,
    pub attempt: u32,
    pub consecutive_errors: u32,
    pub last_known_status: String,
}

/// Result of feeding one observation into the state machine.
#[derive(Debug)]
pub enum Step {
    /// Keep polling.
    Continue,
    /// Terminal phase reached.
    Done(MusicResult<Vec<GenerationTask>>),
}

impl Default for PollState {
    fn default() -> Self {
        Self::new()
    }
}

impl PollState {
    pub fn new() -> Self {
        Self {
            phase: PollPhase::Submitted,
            attempt: 0,
            consecutive_errors: 0,
            last_known_status: UNKNOWN_STATUS.to_string(),
        }
    }

    /// Record the start of a query.
    pub fn begin_attempt(&mut self) {
        self.attempt += 1;
        self.phase = PollPhase::Polling;
    }

    pub fn budget_spent(&self, config: &PollConfig) -> bool {
        self.attempt >= config.max_attempts
    }

    /// Apply one query outcome.
    pub fn observe(
        &mut self,
        outcome: MusicResult<StatusData>,
        config: &PollConfig,
        task_id: &TaskId,
    ) -> Step {
        let data = match outcome {
            Ok(data) => data,
            Err(e) if e.is_transient() => {
                self.consecutive_errors += 1;
                if self.consecutive_errors >= config.max_consecutive_errors {
                    self.phase = PollPhase::Escalated;
                    return Step::Done(Err(MusicError::Escalated {
                        errors: self.consecutive_errors,
                        last_error: e.to_string(),
                    }));
                }
                return Step::Continue;
            }
            Err(e) => {
                self.phase = PollPhase::Failed;
                return Step::Done(Err(e));
            }
        };

        self.consecutive_errors = 0;
        let status = data.effective_status();
        if !status.is_empty() {
            self.last_known_status = status.clone();
        }

        match StatusClass::classify(&status) {
            StatusClass::Failure => {
                self.phase = PollPhase::Failed;
                Step::Done(Err(MusicError::TaskFailed {
                    message: data.failure_message(&status),
                    status,
                }))
            }
            StatusClass::Success => {
                let playable: Vec<GenerationTask> = normalize(&data)
                    .into_iter()
                    .filter(GenerationTask::is_playable)
                    .collect();

                if !playable.is_empty() {
                    self.phase = PollPhase::Succeeded;
                    Step::Done(Ok(playable))
                } else if StatusClass::is_final_success(&status) {
                    self.phase = PollPhase::Failed;
                    Step::Done(Err(MusicError::MissingOutput {
                        task_id: task_id.to_string(),
                        status,
                    }))
                } else {
                    Step::Continue
                }
            }
            StatusClass::Pending => Step::Continue,
        }
    }

    /// Timeout error naming the last status seen.
    pub fn timeout_error(&self, task_id: &TaskId, elapsed: Duration) -> MusicError {
        MusicError::Timeout {
            task_id: task_id.to_string(),
            attempts: self.attempt,
            elapsed_secs: elapsed.as_secs(),
            last_status: self.last_known_status.clone(),
        }
    }

    /// Progress snapshot for the current state.
    pub fn progress(&self, task_id: &TaskId, config: &PollConfig, elapsed: Duration) -> PollProgress {
        PollProgress {
            task_id: task_id.to_string(),
            status: self.last_known_status.clone(),
            attempt: self.attempt,
            max_attempts: config.max_attempts,
            elapsed,
            percent: coarse_percent(&self.last_known_status, self.attempt, config.max_attempts),
            retrying: self.consecutive_errors > 0,
        }
    }
}

/// Stage floor from the status, raised by the share of the budget used.
fn coarse_percent(status: &str, attempt: u32, max_attempts: u32) -> u8 {
    let floor: u32 = match status.to_ascii_uppercase().as_str() {
        "TEXT_SUCCESS" => 40,
        "FIRST_SUCCESS" => 70,
        _ => 5,
    };
    let by_budget = if max_attempts == 0 {
        0
    } else {
        attempt.saturating_mul(90) / max_attempts
    };
    floor.max(by_budget).min(95) as u8
}

/// Polls a submitted task until it reaches a terminal phase.
#[derive(Clone)]
pub struct TaskPoller {
    backend: Arc<dyn MusicBackend>,
    config: PollConfig,
}

impl TaskPoller {
    pub fn new(backend: Arc<dyn MusicBackend>, config: PollConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Poll a music generation task.
    pub async fn poll(
        &self,
        task_id: &TaskId,
        credential: &str,
        on_progress: Option<&ProgressFn<'_>>,
    ) -> MusicResult<Vec<GenerationTask>> {
        self.poll_kind(TaskKind::Music, task_id, credential, on_progress)
            .await
    }

    /// Poll a task of any kind.
    ///
    /// Returns the playable tracks in provider order.
    pub async fn poll_kind(
        &self,
        kind: TaskKind,
        task_id: &TaskId,
        credential: &str,
        on_progress: Option<&ProgressFn<'_>>,
    ) -> MusicResult<Vec<GenerationTask>> {
        if credential.trim().is_empty() {
            return Err(MusicError::config("Music API credential is missing"));
        }

        let logger = TaskLogger::new(task_id, kind);
        let span = logger.span();

        async {
            logger.started(&self.config);

            let started = Instant::now();
            let mut state = PollState::new();

            while !state.budget_spent(&self.config) {
                tokio::time::sleep(self.config.interval).await;
                state.begin_attempt();

                let outcome = self.backend.fetch_status(kind, task_id, credential).await;
                record_poll(kind.as_str(), if outcome.is_ok() { "ok" } else { "error" });
                if let Err(e) = &outcome {
                    logger.query_failed(state.attempt, state.consecutive_errors + 1, e);
                }

                match state.observe(outcome, &self.config, task_id) {
                    Step::Continue => {
                        let progress = state.progress(task_id, &self.config, started.elapsed());
                        if !progress.retrying {
                            logger.pending(state.attempt, &progress.status, progress.percent);
                        }
                        report(on_progress, &progress);
                    }
                    Step::Done(result) => {
                        record_task_finished(
                            kind.as_str(),
                            state.phase.as_str(),
                            started.elapsed().as_secs_f64(),
                        );
                        match &result {
                            Ok(tracks) => {
                                logger.succeeded(state.attempt, tracks.len(), started.elapsed())
                            }
                            Err(e) => logger.gave_up(state.phase, state.attempt, e),
                        }
                        return result;
                    }
                }
            }

            state.phase = PollPhase::TimedOut;
            record_task_finished(
                kind.as_str(),
                state.phase.as_str(),
                started.elapsed().as_secs_f64(),
            );
            let err = state.timeout_error(task_id, started.elapsed());
            logger.gave_up(state.phase, state.attempt, &err);
            Err(err)
        }
        .instrument(span)
        .await
    }
}

/// Deliver progress, swallowing panics from the callback.
fn report(on_progress: Option<&ProgressFn<'_>>, progress: &PollProgress) {
    let Some(callback) = on_progress else {
        return;
    };
    if catch_unwind(AssertUnwindSafe(|| callback(progress))).is_err() {
        warn!(task_id = %progress.task_id, "Progress callback panicked; ignoring");
    }
}
