//! Tracing setup for the `vtrack` binary.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_DIRECTIVES: &str = "vtrack=info,vtrack_gemini=info,vtrack_music=info,vtrack_pipeline=info,hyper=warn,reqwest=warn";

/// Build the env filter, honouring `RUST_LOG` when present.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Install the global subscriber.
///
/// Logs go to stderr so stdout stays reserved for the JSON result. JSON
/// lines for production, coloured text otherwise.
pub fn init_tracing(json: bool) {
    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter())
            .init();
    }
}
