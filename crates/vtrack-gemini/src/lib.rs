//! Multimodal analysis client for the Gemini `generateContent` API.
//!
//! Turns a script and/or a video into a structured [`AnalysisResult`]:
//! - [`PayloadBuilder`] assembles the request parts (inline base64 media,
//!   media references, fixed instruction, script text)
//! - [`AnalysisClient`] sends the request under a wall-clock budget and
//!   pulls the JSON object out of free-form model output
//!
//! [`AnalysisResult`]: vtrack_models::AnalysisResult

pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod metrics;
pub mod payload;
pub mod types;


pub use client::AnalysisClient;
pub use config::{GeminiConfig, MediaMode};
pub use error::{AnalysisError, GeminiResult};
pub use payload::{MediaPart, PayloadBuilder, RequestParts};
