//! Music generation client.
//!
//! Drives one generation job from submission to completion:
//! - [`MusicClient`] submits jobs and queries their status
//! - [`TaskPoller`] runs the polling state machine with bounded retries
//! - [`normalize`] maps provider payloads onto [`GenerationTask`] records
//!
//! [`GenerationTask`]: vtrack_models::GenerationTask

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod normalize;
pub mod poller;
pub mod types;


pub use client::{MusicBackend, MusicClient};
pub use config::{MusicConfig, PollConfig};
pub use error::{MusicError, MusicResult};
pub use normalize::normalize;
pub use poller::{PollPhase, PollProgress, PollState, ProgressFn, TaskPoller};
pub use types::{GenerationRequest, StatusData, TaskKind};
