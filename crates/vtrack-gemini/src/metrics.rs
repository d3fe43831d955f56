//! Analysis metrics collection.

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Total analysis calls by outcome.
    pub const ANALYSES_TOTAL: &str = "vtrack_analyses_total";

    /// Analysis latency in seconds.
    pub const ANALYSIS_LATENCY_SECONDS: &str = "vtrack_analysis_latency_seconds";

    /// Bytes of media sent inline.
    pub const INLINE_MEDIA_BYTES: &str = "vtrack_inline_media_bytes";
}

/// Record a finished analysis call.
pub fn record_analysis(outcome: &str, latency_ms: f64) {
    counter!(names::ANALYSES_TOTAL, "outcome" => outcome.to_string()).increment(1);
    histogram!(names::ANALYSIS_LATENCY_SECONDS).record(latency_ms / 1000.0);
}

/// Record the size of media embedded in a request.
pub fn record_inline_media(bytes: usize) {
    histogram!(names::INLINE_MEDIA_BYTES).record(bytes as f64);
}
