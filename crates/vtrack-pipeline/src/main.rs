//! vtrack - generate a soundtrack for a video and/or script.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing::{error, info};

use vtrack_gemini::{AnalysisClient, MediaMode};
use vtrack_models::MediaRef;
use vtrack_music::MusicClient;
use vtrack_pipeline::{
    logging, AppConfig, Orchestrator, PipelineError, PipelineEvent, PipelineProgressFn,
    PipelineResult, SoundtrackRequest,
};

/// Command-line arguments for vtrack
#[derive(Parser, Debug)]
#[command(name = "vtrack")]
#[command(about = "Analyze a video or script and generate a matching soundtrack")]
#[command(version)]
struct Args {
    /// Script file, or `-` to read from stdin
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Local video file, sent inline
    #[arg(long, conflicts_with = "video_url")]
    video: Option<PathBuf>,

    /// Publicly reachable video URL
    #[arg(long)]
    video_url: Option<String>,

    /// MIME type of --video (guessed from the extension otherwise)
    #[arg(long)]
    mime: Option<String>,

    /// Skip analysis and generate from this prompt
    #[arg(short, long)]
    prompt: Option<String>,

    /// Generate without vocals (default)
    #[arg(long, overrides_with = "vocals")]
    instrumental: bool,

    /// Generate with vocals
    #[arg(long)]
    vocals: bool,

    /// Style tags, e.g. "cinematic, strings"
    #[arg(long)]
    style: Option<String>,

    /// Track title
    #[arg(long)]
    title: Option<String>,

    /// How URL media reaches the analysis model: proxy or inline
    /// (overrides ANALYSIS_MEDIA_MODE)
    #[arg(long)]
    media_mode: Option<String>,

    /// Also convert the first track to WAV
    #[arg(long)]
    wav: bool,

    /// Stop after analysis
    #[arg(long, conflicts_with = "prompt")]
    analyze_only: bool,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(c) => c,
        Err(e) => {
            logging::init_tracing(false);
            fail(&e);
        }
    };
    logging::init_tracing(config.log_json);

    if let Err(e) = run(args, config).await {
        match e.downcast_ref::<PipelineError>() {
            Some(pipeline) => fail(pipeline),
            None => {
                error!("{:#}", e);
                eprintln!("error: {:#}", e);
                std::process::exit(1);
            }
        }
    }
}

/// Environment config with command-line overrides applied.
fn load_config(args: &Args) -> PipelineResult<AppConfig> {
    let mut config = AppConfig::from_env()?;
    if let Some(mode) = &args.media_mode {
        config.gemini.media_mode = mode.parse::<MediaMode>()?;
    }
    Ok(config)
}

async fn run(args: Args, config: AppConfig) -> Result<()> {
    let request = build_request(&args).await?;
    config.validate(request.needs_analysis(), !args.analyze_only)?;

    // Analysis-only runs never reach the music service.
    let credential = config.music.api_key.clone().unwrap_or_default();
    let analyzer = AnalysisClient::new(config.gemini.clone()).map_err(PipelineError::from)?;
    let music = MusicClient::new(config.music.clone()).map_err(PipelineError::from)?;
    let orchestrator = Orchestrator::new(
        Arc::new(analyzer),
        Arc::new(music),
        config.poll.clone(),
        credential,
    );

    info!(
        media_mode = config.gemini.media_mode.as_str(),
        poll_attempts = config.poll.max_attempts,
        "Starting vtrack"
    );

    let output = if args.analyze_only {
        let analysis = orchestrator.analyze(&request).await?;
        serde_json::to_string_pretty(&analysis)?
    } else {
        let progress = |event: &PipelineEvent| eprintln!("[{}] {}", event.stage(), event.message());
        let outcome = orchestrator
            .run(&request, Some(&progress as &PipelineProgressFn<'_>))
            .await?;
        serde_json::to_string_pretty(&outcome)?
    };

    println!("{}", output);
    Ok(())
}

async fn build_request(args: &Args) -> Result<SoundtrackRequest> {
    let script_text = match &args.script {
        Some(path) => read_script(path).await?,
        None => String::new(),
    };

    let media = match (&args.video, &args.video_url) {
        (Some(path), _) => {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read video {}", path.display()))?;
            let mime = args
                .mime
                .clone()
                .unwrap_or_else(|| guess_mime(path).to_string());
            Some(MediaRef::inline(bytes, mime))
        }
        (None, Some(url)) => Some(MediaRef::url(url.clone())),
        (None, None) => None,
    };

    Ok(SoundtrackRequest {
        script_text,
        media,
        prompt: args.prompt.clone(),
        title: args.title.clone(),
        style: args.style.clone(),
        instrumental: !args.vocals || args.instrumental,
        wav: args.wav,
    })
}

async fn read_script(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("Failed to read script from stdin")?;
        return Ok(text);
    }
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read script {}", path.display()))
}

fn guess_mime(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        _ => "video/mp4",
    }
}

fn fail(err: &PipelineError) -> ! {
    error!(kind = %err.kind(), "{}", err);
    eprintln!("error [{}]: {}", err.kind(), err);
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime(Path::new("clip.WEBM")), "video/webm");
        assert_eq!(guess_mime(Path::new("clip.mov")), "video/quicktime");
        assert_eq!(guess_mime(Path::new("clip")), "video/mp4");
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "vtrack",
            "--script",
            "scene.txt",
            "--video-url",
            "https://cdn/clip.mp4",
            "--vocals",
            "--wav",
        ])
        .unwrap();
        assert_eq!(args.script.as_deref(), Some(Path::new("scene.txt")));
        assert!(args.vocals);
        assert!(args.wav);
        assert!(!args.analyze_only);
    }

    #[test]
    fn test_video_and_url_conflict() {
        let result = Args::try_parse_from([
            "vtrack",
            "--video",
            "a.mp4",
            "--video-url",
            "https://cdn/a.mp4",
        ]);
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_media_mode_flag_overrides_environment() {
        std::env::set_var("ANALYSIS_MEDIA_MODE", "proxy");

        let plain = Args::try_parse_from(["vtrack", "--prompt", "lofi"]).unwrap();
        assert_eq!(plain.media_mode, None);
        assert_eq!(load_config(&plain).unwrap().gemini.media_mode, MediaMode::Proxy);

        let flagged =
            Args::try_parse_from(["vtrack", "--prompt", "lofi", "--media-mode", "inline"]).unwrap();
        assert_eq!(load_config(&flagged).unwrap().gemini.media_mode, MediaMode::Inline);

        let bad = Args::try_parse_from(["vtrack", "--media-mode", "carrier-pigeon"]).unwrap();
        let err = load_config(&bad).unwrap_err();
        assert_eq!(err.kind(), vtrack_models::ErrorKind::Config);

        std::env::remove_var("ANALYSIS_MEDIA_MODE");
    }

    #[test]
    fn test_analyze_only_parses_without_prompt() {
        let args = Args::try_parse_from(["vtrack", "--script", "s.txt", "--analyze-only"]).unwrap();
        assert!(args.analyze_only);
        assert!(Args::try_parse_from(["vtrack", "--analyze-only", "--prompt", "p"]).is_err());
    }
}
