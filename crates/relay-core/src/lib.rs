//! Core types and traits for the relay routing engine.
//!
//! This crate provides the request/result types, error handling, and the
//! collaborator traits (text backends and the image pipeline) shared by the
//! provider crates and the dispatcher.

/// Error types and result definitions.
pub mod error;
/// Poison-tolerant lock helpers.
pub mod sync;
/// Trait definitions for generation backends and the image pipeline.
pub mod traits;
/// Core data types for requests, results, and model metadata.
pub mod types;

pub use error::{Error, Result};
pub use sync::{IgnoreLock, IgnoreRwLock};
pub use traits::{ImageGenerator, ModelProvider};
pub use types::{
    Completion, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, GenerationOptions, GenerationRequest,
    GenerationResult, ImageModelInfo, ImageRequest, ImageResult, ModelInfo, ModelKind,
};
