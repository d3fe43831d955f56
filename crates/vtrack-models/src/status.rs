//! Classification of music-provider status strings.
//!
//! The provider vocabulary drifts between API versions (`PENDING`,
//! `TEXT_SUCCESS`, `FIRST_SUCCESS`, `SUCCESS`, `CREATE_TASK_FAILED`,
//! `GENERATE_AUDIO_FAILED`, `CALLBACK_EXCEPTION`, `SENSITIVE_WORD_ERROR`, ...).
//! Classification works on substrings so new statuses degrade to
//! non-terminal instead of breaking the poll loop.

use serde::{Deserialize, Serialize};

/// Where a provider status sits in the task lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    /// Still queued or generating (also any unknown status)
    Pending,
    /// Success-class terminal status
    Success,
    /// Definitive failure; never retried
    Failure,
}

impl StatusClass {
    /// Classify a raw provider status.
    ///
    /// Failure markers win over success markers so a status such as
    /// `SUCCESS_CALLBACK_EXCEPTION` is treated as a failure.
    pub fn classify(status: &str) -> Self {
        let upper = status.trim().to_ascii_uppercase();
        if upper.contains("FAILED") || upper.contains("ERROR") || upper.contains("EXCEPTION") {
            StatusClass::Failure
        } else if upper == "SUCCESS" || upper.ends_with("_SUCCESS") {
            StatusClass::Success
        } else {
            StatusClass::Pending
        }
    }

    /// True when the status is exactly `SUCCESS`, i.e. generation finished
    /// for every track rather than an intermediate stage.
    pub fn is_final_success(status: &str) -> bool {
        status.trim().eq_ignore_ascii_case("SUCCESS")
    }

    /// Check if this is a terminal class.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StatusClass::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_statuses() {
        for status in [
            "CREATE_TASK_FAILED",
            "GENERATE_AUDIO_FAILED",
            "GENERATE_LYRICS_FAILED",
            "CALLBACK_EXCEPTION",
            "SENSITIVE_WORD_ERROR",
        ] {
            assert_eq!(StatusClass::classify(status), StatusClass::Failure, "{}", status);
        }
    }

    #[test]
    fn test_success_statuses() {
        for status in ["SUCCESS", "TEXT_SUCCESS", "FIRST_SUCCESS", "success"] {
            assert_eq!(StatusClass::classify(status), StatusClass::Success, "{}", status);
        }
        assert!(StatusClass::is_final_success("SUCCESS"));
        assert!(!StatusClass::is_final_success("FIRST_SUCCESS"));
    }

    #[test]
    fn test_unknown_statuses_are_pending() {
        for status in ["PENDING", "QUEUED", "RUNNING", "", "SUCCESSFUL_SOON"] {
            assert_eq!(StatusClass::classify(status), StatusClass::Pending, "{}", status);
        }
        assert!(!StatusClass::Pending.is_terminal());
    }
}
