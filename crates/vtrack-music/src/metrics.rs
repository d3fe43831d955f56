//! Music task metrics collection.
//!
//! Provides counters for:
//! - Submissions by kind and outcome
//! - Status queries by outcome
//! - Final poll outcomes and their duration

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Job submissions by kind and outcome.
    pub const SUBMISSIONS_TOTAL: &str = "vtrack_music_submissions_total";

    /// Status queries by outcome (ok, transient_error).
    pub const POLLS_TOTAL: &str = "vtrack_music_polls_total";

    /// Finished poll loops by terminal phase.
    pub const TASKS_FINISHED_TOTAL: &str = "vtrack_music_tasks_finished_total";

    /// Time from first poll to terminal phase, in seconds.
    pub const TASK_DURATION_SECONDS: &str = "vtrack_music_task_duration_seconds";
}

pub fn record_submission(kind: &str, outcome: &str) {
    counter!(
        names::SUBMISSIONS_TOTAL,
        "kind" => kind.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

pub fn record_poll(kind: &str, outcome: &str) {
    counter!(
        names::POLLS_TOTAL,
        "kind" => kind.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

pub fn record_task_finished(kind: &str, phase: &str, elapsed_secs: f64) {
    counter!(
        names::TASKS_FINISHED_TOTAL,
        "kind" => kind.to_string(),
        "phase" => phase.to_string()
    )
    .increment(1);

    histogram!(names::TASK_DURATION_SECONDS, "kind" => kind.to_string()).record(elapsed_secs);
}
