//! Music client and poller configuration.

use std::time::Duration;

use crate::error::{MusicError, MusicResult};

/// Default music API host.
pub const DEFAULT_BASE_URL: &str = "https://api.sunoapi.org";

/// Default generation model.
pub const DEFAULT_MODEL: &str = "V4_5";

/// The generate endpoint insists on a callback URL even though results are
/// collected by polling. Nothing listens here.
pub const PLACEHOLDER_CALLBACK_URL: &str = "https://example.com/vtrack/callback";

/// Configuration for the music HTTP client.
#[derive(Debug, Clone)]
pub struct MusicConfig {
    /// Default credential seeded at startup; calls still take it explicitly
    pub api_key: Option<String>,
    /// Base URL of the music API
    pub base_url: String,
    /// Generation model
    pub model: String,
    /// Per-request HTTP timeout
    pub http_timeout: Duration,
    /// Value sent as `callBackUrl`
    pub callback_url: String,
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            http_timeout: Duration::from_secs(30),
            callback_url: PLACEHOLDER_CALLBACK_URL.to_string(),
        }
    }
}

impl MusicConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("MUSIC_API_KEY")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            base_url: std::env::var("MUSIC_API_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: std::env::var("MUSIC_MODEL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            http_timeout: Duration::from_secs(
                std::env::var("MUSIC_HTTP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            callback_url: PLACEHOLDER_CALLBACK_URL.to_string(),
        }
    }

    /// The seeded credential, or a configuration error.
    pub fn credential(&self) -> MusicResult<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| MusicError::config("MUSIC_API_KEY not configured"))
    }

    /// Join a path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Polling limits.
///
/// The wall-clock ceiling is implicit: `interval × max_attempts` plus the
/// time spent in each status request.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Sleep before every status query
    pub interval: Duration,
    /// Status queries before giving up
    pub max_attempts: u32,
    /// Consecutive failed queries before escalating
    pub max_consecutive_errors: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 60,
            max_consecutive_errors: 5,
        }
    }
}

impl PollConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            interval: std::env::var("POLL_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.interval),
            max_attempts: std::env::var("POLL_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_attempts),
            max_consecutive_errors: std::env::var("POLL_MAX_CONSECUTIVE_ERRORS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_consecutive_errors),
        }
    }

    /// Upper bound on time spent sleeping between polls.
    pub fn ceiling(&self) -> Duration {
        self.interval.saturating_mul(self.max_attempts)
    }
}
