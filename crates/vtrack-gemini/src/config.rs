//! Analysis client configuration.

use std::str::FromStr;
use std::time::Duration;

use crate::error::{AnalysisError, GeminiResult};

/// Default public endpoint for the Gemini REST API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model for analysis.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// How a media URL reaches the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaMode {
    /// Forward the URL as a `fileData` part; the endpoint's proxy fetches it.
    Proxy,
    /// Fetch the bytes here and send them inline as base64.
    #[default]
    Inline,
}

impl MediaMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaMode::Proxy => "proxy",
            MediaMode::Inline => "inline",
        }
    }
}

impl FromStr for MediaMode {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "proxy" | "server" => Ok(MediaMode::Proxy),
            "inline" | "client" => Ok(MediaMode::Inline),
            other => Err(AnalysisError::config(format!(
                "Unknown media mode '{}', expected 'proxy' or 'inline'",
                other
            ))),
        }
    }
}

/// Configuration for the analysis client.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Bearer credential for the analysis endpoint
    pub api_key: Option<String>,
    /// Base URL, without trailing slash
    pub base_url: String,
    /// Model name used in the request path
    pub model: String,
    /// Wall-clock budget for one analysis, media fetch included
    pub timeout: Duration,
    /// How media URLs are handled
    pub media_mode: MediaMode,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(120),
            media_mode: MediaMode::default(),
        }
    }
}

impl GeminiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> GeminiResult<Self> {
        let media_mode = match std::env::var("ANALYSIS_MEDIA_MODE") {
            Ok(s) if !s.trim().is_empty() => s.parse()?,
            _ => MediaMode::default(),
        };

        Ok(Self {
            api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            base_url: std::env::var("GEMINI_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: std::env::var("GEMINI_MODEL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout: Duration::from_secs(
                std::env::var("ANALYSIS_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
            media_mode,
        })
    }

    /// Credential and endpoint must be present before any request is made.
    pub fn validate(&self) -> GeminiResult<&str> {
        if self.base_url.trim().is_empty() {
            return Err(AnalysisError::config("Analysis endpoint is not configured"));
        }
        if self.model.trim().is_empty() {
            return Err(AnalysisError::config("Analysis model is not configured"));
        }
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AnalysisError::config("GEMINI_API_KEY not configured"))
    }

    /// Full `generateContent` URL for the configured model.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_config_defaults() {
        let config = GeminiConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert_eq!(config.media_mode, MediaMode::Inline);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_endpoint_trims_slash() {
        let config = GeminiConfig {
            base_url: "http://localhost:9000/v1beta/".to_string(),
            model: "gemini-2.5-pro".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.endpoint(),
            "http://localhost:9000/v1beta/models/gemini-2.5-pro:generateContent"
        );
    }

    #[test]
    fn test_media_mode_parse() {
        assert_eq!("proxy".parse::<MediaMode>().unwrap(), MediaMode::Proxy);
        assert_eq!(" Inline ".parse::<MediaMode>().unwrap(), MediaMode::Inline);
        assert!("sideways".parse::<MediaMode>().is_err());
    }

    #[test]
    fn test_validate_rejects_blank_key() {
        let config = GeminiConfig {
            api_key: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AnalysisError::Config(_))));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var("GEMINI_API_KEY", "env-key");
        std::env::set_var("ANALYSIS_TIMEOUT_SECS", "45");
        std::env::set_var("ANALYSIS_MEDIA_MODE", "proxy");
        let config = GeminiConfig::from_env().unwrap();
        assert_eq!(config.api_key.as_deref(), Some("env-key"));
        assert_eq!(config.timeout, Duration::from_secs(45));
        assert_eq!(config.media_mode, MediaMode::Proxy);

        std::env::set_var("ANALYSIS_MEDIA_MODE", "bogus");
        assert!(GeminiConfig::from_env().is_err());

        std::env::remove_var("GEMINI_API_KEY");
        std::env::remove_var("ANALYSIS_TIMEOUT_SECS");
        std::env::remove_var("ANALYSIS_MEDIA_MODE");
    }
}
