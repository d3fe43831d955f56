//! Application configuration.

use vtrack_gemini::GeminiConfig;
use vtrack_music::{MusicConfig, PollConfig};

use crate::error::{PipelineError, PipelineResult};

/// Everything the pipeline reads from the environment.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub gemini: GeminiConfig,
    pub music: MusicConfig,
    pub poll: PollConfig,
    /// Emit JSON log lines instead of coloured text
    pub log_json: bool,
}

impl AppConfig {
    /// Create config from environment variables.
    pub fn from_env() -> PipelineResult<Self> {
        Ok(Self {
            gemini: GeminiConfig::from_env()?,
            music: MusicConfig::from_env(),
            poll: PollConfig::from_env(),
            log_json: log_json_from_env(),
        })
    }

    /// Check that the credentials needed for a run are present.
    ///
    /// Each key is only required when its stage will run.
    pub fn validate(&self, needs_analysis: bool, needs_music: bool) -> PipelineResult<()> {
        if needs_analysis {
            self.gemini.validate()?;
        }
        if !needs_music {
            return Ok(());
        }
        self.music.credential()?;
        if self.poll.max_attempts == 0 {
            return Err(PipelineError::config("POLL_MAX_ATTEMPTS must be positive"));
        }
        Ok(())
    }
}

pub(crate) fn log_json_from_env() -> bool {
    std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}
