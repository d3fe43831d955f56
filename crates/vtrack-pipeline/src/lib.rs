//! Soundtrack pipeline.
//!
//! This crate provides:
//! - The [`Orchestrator`] sequencing analysis, submission and polling
//! - Application configuration assembled from the environment
//! - Tracing setup shared by the `vtrack` binary

pub mod config;
pub mod error;
pub mod logging;
pub mod orchestrator;

#[cfg(test)]
mod orchestrator_tests;

pub use config::AppConfig;
pub use error::{PipelineError, PipelineResult};
pub use orchestrator::{
    Orchestrator, PipelineEvent, PipelineProgressFn, SceneAnalyzer, SoundtrackOutcome,
    SoundtrackRequest,
};
