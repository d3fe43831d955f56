//! Error taxonomy shared by every VTrack crate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse classification of a failure.
///
/// Each crate keeps its own error enum; every variant maps to exactly one
/// kind so callers can decide how to present or retry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad or missing caller input, detected before any I/O
    Validation,
    /// Missing credential or endpoint
    Config,
    /// Transport-level failure: network error or non-2xx status
    Upstream,
    /// Well-formed response carrying an application-level failure
    Provider,
    /// Response body could not be coerced to the expected structure
    Parse,
    /// Wall-clock or attempt budget exceeded
    Timeout,
}

impl ErrorKind {
    /// Get string representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Config => "config",
            ErrorKind::Upstream => "upstream",
            ErrorKind::Provider => "provider",
            ErrorKind::Parse => "parse",
            ErrorKind::Timeout => "timeout",
        }
    }

    /// Kinds raised before any network call; never retried.
    pub fn is_precondition(&self) -> bool {
        matches!(self, ErrorKind::Validation | ErrorKind::Config)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
