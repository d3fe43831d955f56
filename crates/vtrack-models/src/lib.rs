//! Shared data models for the VTrack soundtrack pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Analysis requests (script text and media references)
//! - Structured analysis results returned by the language model
//! - Generation tasks produced by the music service
//! - Provider status classification and the error taxonomy

pub mod analysis;
pub mod error_kind;
pub mod status;
pub mod task;

// Re-export common types
pub use analysis::{AnalysisRequest, AnalysisResult, MediaRef, MediaRefError};
pub use error_kind::ErrorKind;
pub use status::StatusClass;
pub use task::{GenerationTask, TaskId, TrackStatus, DEFAULT_TRACK_TITLE};
